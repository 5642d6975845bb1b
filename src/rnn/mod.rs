/*!
A single hidden layer recurrent network, trained one sample at a time by backpropagation through time.

A model moves through three states: idle, forward-computed, and backpropagated. [`Rnn::forward`] records the hidden
state of every step, [`Rnn::backward`] consumes that history to compute and apply gradients, and
[`Rnn::clear_history`] returns the model to idle for the next sample. Calling these out of order is an error rather
than a silent misuse of a stale history.
*/
use crate::linalg::Matrix;
use crate::util::clip;
use num::Float;
use rand::distributions::uniform::SampleUniform;
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

mod serial;

pub use serial::SEPARATOR;

/// The floating point types a model can be built over
pub trait RnnFloat: Float + SampleUniform + Display + FromStr + Debug {}

impl<F: Float + SampleUniform + Display + FromStr + Debug> RnnFloat for F {}

/// The nonlinearity applied to the hidden layer
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Activation {
    /// The logistic function `1 / (1 + e^-x)`
    Sigmoid,
    /// The hyperbolic tangent
    Tanh,
    /// `max(0, x)`
    Relu,
}

impl Default for Activation {
    fn default() -> Activation {
        Activation::Tanh
    }
}

impl Display for Activation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Relu => "relu",
        };
        f.write_str(name)
    }
}

impl FromStr for Activation {
    type Err = RnnError;
    fn from_str(s: &str) -> Result<Activation, RnnError> {
        match s {
            "sigmoid" => Ok(Activation::Sigmoid),
            "tanh" => Ok(Activation::Tanh),
            "relu" => Ok(Activation::Relu),
            _ => Err(RnnError::InvalidField {
                field: "activation",
                value: s.to_string(),
            }),
        }
    }
}

impl Activation {
    /// Apply this activation to a value
    #[inline]
    pub fn apply<F: Float>(self, x: F) -> F {
        match self {
            Activation::Sigmoid => F::one() / (F::one() + (-x).exp()),
            Activation::Tanh => x.tanh(),
            Activation::Relu => x.max(F::zero()),
        }
    }

    /// The derivative of this activation, expressed in terms of its output `y`
    #[inline]
    pub fn derivative<F: Float>(self, y: F) -> F {
        match self {
            Activation::Sigmoid => y * (F::one() - y),
            Activation::Tanh => F::one() - y * y,
            Activation::Relu => {
                if y > F::zero() {
                    F::one()
                } else {
                    F::zero()
                }
            }
        }
    }

    /// Apply this activation to every element of a matrix, in place
    pub fn apply_in_place<F: Float, const R: usize, const C: usize>(self, m: &mut Matrix<F, R, C>) {
        m.for_each(|x| *x = self.apply(*x))
    }
}

/// How [`Rnn::backward`] computes gradients
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Backprop {
    /// The historical procedure: walk the whole history with a single output-layer hidden gradient, accumulating
    /// into both biases and the hidden-to-output weights. The local gradient always uses the `tanh` form
    /// `1 - h^2`, and the input-to-hidden weights receive no gradient.
    Observed,
    /// The exact gradient of the forward computation with respect to all four parameters.
    ///
    /// Every step of the forward pass sees the same input and no earlier hidden state, so only the final step
    /// reaches the output; the gradient flows through that step alone.
    Exact,
}

impl Default for Backprop {
    fn default() -> Backprop {
        Backprop::Observed
    }
}

/// Where a model is in the forward/backward protocol
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
enum Pass {
    Idle,
    Forward,
    Backward,
}

/// A misuse of a model, or a malformed serialized model
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum RnnError {
    /// `forward` was called while a previous sample's history was still held
    #[error("forward pass attempted before the previous sample's history was cleared")]
    HistoryNotCleared,
    /// `backward` was called without a forward pass whose history has not yet been consumed
    #[error("backward pass attempted without a pending forward pass")]
    NoForwardPass,
    /// A serialized model was built with different dimensions than the target type
    #[error("invalid {dimension} size: model has {expected}, serialized model has {found}")]
    DimensionMismatch {
        /// Which dimension mismatched: input, hidden or output
        dimension: &'static str,
        /// The dimension of the target type
        expected: usize,
        /// The persisted dimension
        found: usize,
    },
    /// A serialized model ended early
    #[error("serialized model is missing field {0}")]
    MissingField(&'static str),
    /// A serialized field could not be parsed
    #[error("invalid value {value:?} for field {field}")]
    InvalidField {
        /// The field being parsed
        field: &'static str,
        /// The offending text
        value: String,
    },
}

/// Gradients for each of a model's parameters
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Gradients<F, const I: usize, const H: usize, const O: usize> {
    /// Input-to-hidden weight gradient
    pub w_i_h: Matrix<F, H, I>,
    /// Hidden-to-output weight gradient
    pub w_h_o: Matrix<F, O, H>,
    /// Hidden bias gradient
    pub b_i_h: Matrix<F, H, 1>,
    /// Output bias gradient
    pub b_h_o: Matrix<F, O, 1>,
}

impl<F: RnnFloat, const I: usize, const H: usize, const O: usize> Gradients<F, I, H, O> {
    /// All-zero gradients
    pub fn zeros() -> Gradients<F, I, H, O> {
        Gradients {
            w_i_h: Matrix::zeros(),
            w_h_o: Matrix::zeros(),
            b_i_h: Matrix::zeros(),
            b_h_o: Matrix::zeros(),
        }
    }

    /// Clip every gradient element to `[-bound, bound]`
    pub fn clip(&mut self, bound: F) {
        let clip_gradient = |g: &mut F| *g = clip(*g, bound);
        self.w_i_h.for_each(clip_gradient);
        self.w_h_o.for_each(clip_gradient);
        self.b_i_h.for_each(clip_gradient);
        self.b_h_o.for_each(clip_gradient);
    }

    /// The largest absolute value of any gradient element
    pub fn max_abs(&self) -> F {
        self.w_i_h
            .iter()
            .chain(self.w_h_o.iter())
            .chain(self.b_i_h.iter())
            .chain(self.b_h_o.iter())
            .fold(F::zero(), |max, g| max.max(g.abs()))
    }
}

/// A recurrent network with `I` inputs, `H` hidden units and `O` outputs
#[derive(Debug, Clone, PartialEq)]
pub struct Rnn<F, const I: usize, const H: usize, const O: usize> {
    /// Input-to-hidden weights
    pub w_i_h: Matrix<F, H, I>,
    /// Hidden-to-output weights
    pub w_h_o: Matrix<F, O, H>,
    /// Hidden bias
    pub b_i_h: Matrix<F, H, 1>,
    /// Output bias
    pub b_h_o: Matrix<F, O, 1>,
    /// The step size of each parameter update
    pub learning_rate: F,
    /// The bound gradients are clipped to before each update
    pub clip: F,
    /// The seed the weights were initialized with
    pub seed: u64,
    /// The hidden layer nonlinearity
    pub activation: Activation,
    /// The gradient procedure used by `backward`
    pub backprop: Backprop,
    history: Vec<Matrix<F, H, 1>>,
    input: Option<Matrix<F, I, 1>>,
    pass: Pass,
}

impl<F: RnnFloat, const I: usize, const H: usize, const O: usize> Rnn<F, I, H, O> {
    /// Create a model with weights drawn uniformly from `[-1, 1]` using `seed` and zero biases
    pub fn new(learning_rate: F, clip: F, seed: u64) -> Rnn<F, I, H, O> {
        Rnn::from_parts(
            Matrix::random_seeded(-F::one(), F::one(), seed),
            Matrix::random_seeded(-F::one(), F::one(), seed),
            Matrix::zeros(),
            Matrix::zeros(),
            learning_rate,
            clip,
            seed,
        )
    }

    /// Create a model from explicit parameters
    pub fn from_parts(
        w_i_h: Matrix<F, H, I>,
        w_h_o: Matrix<F, O, H>,
        b_i_h: Matrix<F, H, 1>,
        b_h_o: Matrix<F, O, 1>,
        learning_rate: F,
        clip: F,
        seed: u64,
    ) -> Rnn<F, I, H, O> {
        Rnn {
            w_i_h,
            w_h_o,
            b_i_h,
            b_h_o,
            learning_rate,
            clip,
            seed,
            activation: Activation::default(),
            backprop: Backprop::default(),
            history: Vec::with_capacity(I + 1),
            input: None,
            pass: Pass::Idle,
        }
    }

    /// Set the hidden layer nonlinearity
    pub fn with_activation(mut self, activation: Activation) -> Rnn<F, I, H, O> {
        self.activation = activation;
        self
    }

    /// Set the gradient procedure
    pub fn with_backprop(mut self, backprop: Backprop) -> Rnn<F, I, H, O> {
        self.backprop = backprop;
        self
    }

    /// The hidden states recorded by the pending forward pass, starting with the initial zero state
    #[inline]
    pub fn history(&self) -> &[Matrix<F, H, 1>] {
        &self.history
    }

    /// The most recent hidden state, if any
    #[inline]
    pub fn hidden_state(&self) -> Option<&Matrix<F, H, 1>> {
        self.history.last()
    }

    /// Run the network over `I` steps of `input`, recording every hidden state, and return its output.
    ///
    /// Every step sees the whole input window, and no step reads the hidden state of the one before it.
    ///
    /// Fails if the history of a previous pass has not been cleared.
    pub fn forward(&mut self, input: &Matrix<F, I, 1>) -> Result<Matrix<F, O, 1>, RnnError> {
        if self.pass != Pass::Idle {
            return Err(RnnError::HistoryNotCleared);
        }
        let mut h = Matrix::zeros();
        self.history.push(h);
        for _step in 0..I {
            h = (self.w_i_h & *input) + self.b_i_h;
            self.activation.apply_in_place(&mut h);
            self.history.push(h);
        }
        self.input = Some(*input);
        self.pass = Pass::Forward;
        Ok((self.w_h_o & h) + self.b_h_o)
    }

    /// Propagate `d_y`, the negated gradient of the loss with respect to the last output (`label - prediction`
    /// for a squared error loss), back through the recorded history, and update every parameter in place by
    /// `parameter + learning_rate * gradient`.
    ///
    /// Returns the clipped gradients which were applied. The history is kept until [`Rnn::clear_history`].
    pub fn backward(&mut self, d_y: &Matrix<F, O, 1>) -> Result<Gradients<F, I, H, O>, RnnError> {
        let input = match (self.pass, self.input) {
            (Pass::Forward, Some(input)) => input,
            _ => return Err(RnnError::NoForwardPass),
        };
        let mut gradients = match self.backprop {
            Backprop::Observed => self.observed_gradients(d_y),
            Backprop::Exact => self.exact_gradients(d_y, &input),
        };
        gradients.clip(self.clip);
        self.apply(&gradients);
        self.pass = Pass::Backward;
        Ok(gradients)
    }

    fn observed_gradients(&self, d_y: &Matrix<F, O, 1>) -> Gradients<F, I, H, O> {
        let mut gradients = Gradients::zeros();
        let ones: Matrix<F, H, 1> = Matrix::ones();
        let d_h = self.w_h_o.transpose() & *d_y;
        for h in self.history.iter().rev() {
            let h_sq = h.map(|x| x * x);
            let d_l_h = (ones - h_sq) * d_h;
            gradients.b_i_h += d_l_h;
            gradients.b_h_o += self.w_h_o & d_l_h;
            gradients.w_h_o += *d_y & h.transpose();
        }
        gradients
    }

    fn exact_gradients(&self, d_y: &Matrix<F, O, 1>, input: &Matrix<F, I, 1>) -> Gradients<F, I, H, O> {
        let activation = self.activation;
        let h = match self.history.last() {
            Some(h) => *h,
            None => return Gradients::zeros(),
        };
        let d_h = self.w_h_o.transpose() & *d_y;
        let d_z = d_h * h.map(|y| activation.derivative(y));
        Gradients {
            w_i_h: d_z & input.transpose(),
            w_h_o: *d_y & h.transpose(),
            b_i_h: d_z,
            b_h_o: *d_y,
        }
    }

    fn apply(&mut self, gradients: &Gradients<F, I, H, O>) {
        let lr = self.learning_rate;
        self.w_i_h += gradients.w_i_h.scale(lr);
        self.w_h_o += gradients.w_h_o.scale(lr);
        self.b_i_h += gradients.b_i_h.scale(lr);
        self.b_h_o += gradients.b_h_o.scale(lr);
    }

    /// Discard the recorded history, readying the model for the next sample
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.input = None;
        self.pass = Pass::Idle;
    }

    /// Run a forward pass without training, leaving the model idle
    pub fn predict(&mut self, input: &Matrix<F, I, 1>) -> Result<Matrix<F, O, 1>, RnnError> {
        let output = self.forward(input)?;
        self.clear_history();
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Small = Rnn<f64, 3, 4, 1>;

    fn input() -> Matrix<f64, 3, 1> {
        Matrix::from_rows([[0.2], [0.5], [0.9]])
    }

    #[test]
    fn history_tracks_forward_and_clear() {
        let mut rnn = Small::new(0.01, 1.0, 42);
        assert!(rnn.history().is_empty());
        assert!(rnn.hidden_state().is_none());
        rnn.forward(&input()).unwrap();
        assert_eq!(rnn.history().len(), 3 + 1);
        assert_eq!(rnn.history()[0], Matrix::zeros());
        rnn.clear_history();
        assert_eq!(rnn.history().len(), 0);
    }

    #[test]
    fn forward_computes_output_from_final_state() {
        let mut rnn = Small::new(0.01, 1.0, 7).with_activation(Activation::Sigmoid);
        let y = rnn.forward(&input()).unwrap();
        let mut h = (rnn.w_i_h & input()) + rnn.b_i_h;
        h.for_each(|x| *x = 1.0 / (1.0 + (-*x).exp()));
        assert_eq!(rnn.hidden_state(), Some(&h));
        assert_eq!(y, (rnn.w_h_o & h) + rnn.b_h_o);
    }

    #[test]
    fn protocol_is_enforced() {
        let mut rnn = Small::new(0.01, 1.0, 42);
        let d_y = Matrix::uniform(0.5);
        assert_eq!(rnn.backward(&d_y), Err(RnnError::NoForwardPass));
        rnn.forward(&input()).unwrap();
        assert_eq!(rnn.forward(&input()), Err(RnnError::HistoryNotCleared));
        rnn.backward(&d_y).unwrap();
        assert_eq!(rnn.backward(&d_y), Err(RnnError::NoForwardPass));
        assert_eq!(rnn.forward(&input()), Err(RnnError::HistoryNotCleared));
        rnn.clear_history();
        assert!(rnn.forward(&input()).is_ok());
    }

    #[test]
    fn predict_leaves_model_idle() {
        let mut rnn = Small::new(0.01, 1.0, 42);
        let first = rnn.predict(&input()).unwrap();
        assert!(rnn.history().is_empty());
        assert_eq!(rnn.predict(&input()).unwrap(), first);
    }

    #[test]
    fn gradients_are_clipped() {
        for &backprop in &[Backprop::Observed, Backprop::Exact] {
            let mut rnn = Small::new(0.001, 0.05, 3).with_backprop(backprop);
            rnn.forward(&input()).unwrap();
            let gradients = rnn.backward(&Matrix::uniform(100.0)).unwrap();
            assert!(gradients.max_abs() <= 0.05);
            assert!(gradients.max_abs() > 0.0);
        }
    }

    #[test]
    fn observed_update_uses_addition() {
        let mut rnn = Small::new(0.5, 10.0, 11);
        let before = rnn.clone();
        rnn.forward(&input()).unwrap();
        let g = rnn.backward(&Matrix::uniform(0.25)).unwrap();
        assert_eq!(g.w_i_h, Matrix::zeros());
        assert_eq!(rnn.w_i_h, before.w_i_h);
        assert_eq!(rnn.w_h_o, before.w_h_o + g.w_h_o.scale(0.5));
        assert_eq!(rnn.b_i_h, before.b_i_h + g.b_i_h.scale(0.5));
        assert_eq!(rnn.b_h_o, before.b_h_o + g.b_h_o.scale(0.5));
    }

    #[test]
    fn observed_gradients_walk_every_history_entry() {
        let mut rnn = Small::new(0.0, 1e9, 5);
        rnn.forward(&input()).unwrap();
        let d_y = Matrix::uniform(0.1);
        let h = *rnn.hidden_state().unwrap();
        let g = rnn.backward(&d_y).unwrap();
        // The initial zero state contributes nothing; the three identical steps contribute equally
        assert_eq!(g.w_h_o, (d_y & h.transpose()).scale(3.0));
        let d_h = rnn.w_h_o.transpose() & d_y;
        let expected_b_i_h = d_h + (Matrix::ones() - h.map(|x| x * x)).scale(3.0) * d_h;
        let diff = g.b_i_h - expected_b_i_h;
        assert!(diff.iter().all(|x| x.abs() < 1e-12));
    }

    fn squared_error(rnn: &mut Small, x: &Matrix<f64, 3, 1>, label: f64) -> f64 {
        let y = rnn.predict(x).unwrap();
        0.5 * (label - y[(0, 0)]).powi(2)
    }

    #[test]
    fn exact_gradients_match_finite_differences() {
        const EPS: f64 = 1e-6;
        let label = 0.3;
        for &activation in &[Activation::Tanh, Activation::Sigmoid] {
            let base = Small::new(0.0, 1e9, 21)
                .with_activation(activation)
                .with_backprop(Backprop::Exact);
            let mut rnn = base.clone();
            let y = rnn.forward(&input()).unwrap();
            let g = rnn.backward(&Matrix::uniform(label - y[(0, 0)])).unwrap();

            let numeric = |perturb: &dyn Fn(&mut Small, f64)| {
                let mut plus = base.clone();
                perturb(&mut plus, EPS);
                let mut minus = base.clone();
                perturb(&mut minus, -EPS);
                (squared_error(&mut plus, &input(), label) - squared_error(&mut minus, &input(), label))
                    / (2.0 * EPS)
            };

            for i in 0..4 {
                for j in 0..3 {
                    let d = numeric(&|m: &mut Small, e: f64| m.w_i_h[(i, j)] += e);
                    assert!((g.w_i_h[(i, j)] + d).abs() < 1e-6, "w_i_h[{}][{}]", i, j);
                }
                let d = numeric(&|m: &mut Small, e: f64| m.b_i_h[(i, 0)] += e);
                assert!((g.b_i_h[(i, 0)] + d).abs() < 1e-6, "b_i_h[{}]", i);
                let d = numeric(&|m: &mut Small, e: f64| m.w_h_o[(0, i)] += e);
                assert!((g.w_h_o[(0, i)] + d).abs() < 1e-6, "w_h_o[{}]", i);
            }
            let d = numeric(&|m: &mut Small, e: f64| m.b_h_o[(0, 0)] += e);
            assert!((g.b_h_o[(0, 0)] + d).abs() < 1e-6, "b_h_o");
        }
    }

    #[test]
    fn exact_step_reduces_loss() {
        let label = 0.8;
        let mut rnn = Small::new(0.05, 5.0, 13).with_backprop(Backprop::Exact);
        let before = squared_error(&mut rnn, &input(), label);
        let y = rnn.forward(&input()).unwrap();
        rnn.backward(&Matrix::uniform(label - y[(0, 0)])).unwrap();
        rnn.clear_history();
        assert!(squared_error(&mut rnn, &input(), label) < before);
    }

    #[test]
    fn activation_derivatives() {
        for &x in &[-2.0f64, -0.3, 0.0, 0.7, 1.9] {
            for &a in &[Activation::Sigmoid, Activation::Tanh] {
                let numeric = (a.apply(x + 1e-6) - a.apply(x - 1e-6)) / 2e-6;
                assert!((a.derivative(a.apply(x)) - numeric).abs() < 1e-8);
            }
        }
        assert_eq!(Activation::Relu.apply(-3.0), 0.0);
        assert_eq!(Activation::Relu.derivative(Activation::Relu.apply(2.0)), 1.0);
    }

    #[test]
    fn activation_names() {
        for &activation in &[Activation::Sigmoid, Activation::Tanh, Activation::Relu] {
            assert_eq!(activation.to_string().parse::<Activation>(), Ok(activation));
        }
        assert_eq!(Activation::Sigmoid.to_string(), "sigmoid");
        assert!("softmax".parse::<Activation>().is_err());
    }
}
