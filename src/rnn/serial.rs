/*!
Text serialization for models.

A serialized model is a flat list of fields, each followed by [`SEPARATOR`]: the input, hidden and output sizes, the
learning rate, the clip bound and the seed, then the elements of `w_i_h`, `b_i_h`, `w_h_o` and `b_h_o`, each in
row-major order. Numbers are written in their shortest round-trip form, so deserializing a serialized model
reproduces it exactly. The activation and gradient procedure are not part of the text; checkpoint files record
the activation in their name.
*/
use super::{Rnn, RnnError, RnnFloat};
use crate::linalg::Matrix;
use std::fmt::Display;
use std::str::FromStr;

/// The ASCII record separator, which terminates every field
pub const SEPARATOR: char = '\x1E';

fn push_field<T: Display>(out: &mut String, value: T) {
    out.push_str(&value.to_string());
    out.push(SEPARATOR);
}

fn push_matrix<F: Display + Copy, const R: usize, const C: usize>(out: &mut String, m: &Matrix<F, R, C>) {
    for value in m.iter() {
        push_field(out, value)
    }
}

fn next_field<'a, S: Iterator<Item = &'a str>>(fields: &mut S, field: &'static str) -> Result<&'a str, RnnError> {
    match fields.next() {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(RnnError::MissingField(field)),
    }
}

fn parse_field<'a, T: FromStr, S: Iterator<Item = &'a str>>(
    fields: &mut S,
    field: &'static str,
) -> Result<T, RnnError> {
    let text = next_field(fields, field)?;
    text.parse().map_err(|_| RnnError::InvalidField {
        field,
        value: text.to_string(),
    })
}

fn check_dimension<'a, S: Iterator<Item = &'a str>>(
    fields: &mut S,
    dimension: &'static str,
    expected: usize,
) -> Result<(), RnnError> {
    let found: usize = parse_field(fields, dimension)?;
    if found != expected {
        return Err(RnnError::DimensionMismatch {
            dimension,
            expected,
            found,
        });
    }
    Ok(())
}

fn parse_matrix<'a, F: RnnFloat, S: Iterator<Item = &'a str>, const R: usize, const C: usize>(
    fields: &mut S,
    field: &'static str,
) -> Result<Matrix<F, R, C>, RnnError> {
    let mut m = Matrix::zeros();
    for i in 0..R {
        for j in 0..C {
            m[(i, j)] = parse_field(fields, field)?;
        }
    }
    Ok(m)
}

impl<F: RnnFloat, const I: usize, const H: usize, const O: usize> Rnn<F, I, H, O> {
    /// Serialize this model's hyperparameters and parameters
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        push_field(&mut out, I);
        push_field(&mut out, H);
        push_field(&mut out, O);
        push_field(&mut out, self.learning_rate);
        push_field(&mut out, self.clip);
        push_field(&mut out, self.seed);
        push_matrix(&mut out, &self.w_i_h);
        push_matrix(&mut out, &self.b_i_h);
        push_matrix(&mut out, &self.w_h_o);
        push_matrix(&mut out, &self.b_h_o);
        out
    }

    /// Deserialize a model written by [`Rnn::serialize`].
    ///
    /// The persisted sizes must match `I`, `H` and `O` exactly: a model cannot be reshaped to fit.
    pub fn deserialize(serialized: &str) -> Result<Rnn<F, I, H, O>, RnnError> {
        let mut fields = serialized.split(SEPARATOR);
        check_dimension(&mut fields, "input", I)?;
        check_dimension(&mut fields, "hidden", H)?;
        check_dimension(&mut fields, "output", O)?;
        let learning_rate = parse_field(&mut fields, "learning rate")?;
        let clip = parse_field(&mut fields, "clip")?;
        let seed = parse_field(&mut fields, "seed")?;
        let w_i_h = parse_matrix(&mut fields, "input-to-hidden weights")?;
        let b_i_h = parse_matrix(&mut fields, "hidden bias")?;
        let w_h_o = parse_matrix(&mut fields, "hidden-to-output weights")?;
        let b_h_o = parse_matrix(&mut fields, "output bias")?;
        Ok(Rnn::from_parts(
            w_i_h,
            w_h_o,
            b_i_h,
            b_h_o,
            learning_rate,
            clip,
            seed,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_reproduces_model() {
        let rnn = Rnn::<f32, 5, 7, 2>::new(0.001, 10.0, 42);
        let restored = Rnn::<f32, 5, 7, 2>::deserialize(&rnn.serialize()).unwrap();
        assert_eq!(restored, rnn);

        let rnn = Rnn::<f64, 1, 1, 1>::new(0.125, 0.5, 7);
        let restored = Rnn::<f64, 1, 1, 1>::deserialize(&rnn.serialize()).unwrap();
        assert_eq!(restored, rnn);
    }

    #[test]
    fn layout() {
        let rnn = Rnn::<f64, 2, 1, 1>::from_parts(
            Matrix::from_rows([[0.5, -1.5]]),
            Matrix::from_rows([[2.0]]),
            Matrix::from_rows([[0.25]]),
            Matrix::from_rows([[-3.0]]),
            0.01,
            1.0,
            9,
        );
        let expected = ["2", "1", "1", "0.01", "1", "9", "0.5", "-1.5", "0.25", "2", "-3"]
            .iter()
            .map(|field| format!("{}\x1E", field))
            .collect::<String>();
        assert_eq!(rnn.serialize(), expected);
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let serialized = Rnn::<f32, 4, 3, 1>::new(0.01, 1.0, 1).serialize();
        assert_eq!(
            Rnn::<f32, 4, 8, 1>::deserialize(&serialized),
            Err(RnnError::DimensionMismatch {
                dimension: "hidden",
                expected: 8,
                found: 3
            })
        );
        assert_eq!(
            Rnn::<f32, 5, 3, 1>::deserialize(&serialized),
            Err(RnnError::DimensionMismatch {
                dimension: "input",
                expected: 5,
                found: 4
            })
        );
    }

    #[test]
    fn malformed_input() {
        let serialized = Rnn::<f32, 2, 2, 1>::new(0.01, 1.0, 1).serialize();
        let truncated = &serialized[..serialized.len() - 4];
        assert!(matches!(
            Rnn::<f32, 2, 2, 1>::deserialize(truncated),
            Err(RnnError::MissingField(_)) | Err(RnnError::InvalidField { .. })
        ));
        assert_eq!(
            Rnn::<f32, 2, 2, 1>::deserialize("2\x1E2\x1E1\x1Efast\x1E"),
            Err(RnnError::InvalidField {
                field: "learning rate",
                value: "fast".to_string()
            })
        );
        assert_eq!(
            Rnn::<f32, 2, 2, 1>::deserialize(""),
            Err(RnnError::MissingField("input"))
        );
    }
}
