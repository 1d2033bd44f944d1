use std::io::{self, BufRead, Write};

use crate::codec::bits::{decode, format_msb_first, modular_sum, round_probabilities, Width};
use crate::error::{AdderError, Result};
use crate::model::rnn::RnnAdder;

/// Outcome of one calculator round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub x0: u64,
    pub x1: u64,
    /// Sum decoded from the network's rounded bit predictions.
    pub predicted: u64,
    /// `(x0 + x1) mod 2^width`.
    pub expected: u64,
    /// Rounded predicted bits, LSB first.
    pub bits: Vec<u8>,
}

impl Prediction {
    pub fn is_correct(&self) -> bool {
        self.predicted == self.expected
    }
}

/// Interactive front end over a trained `RnnAdder`.
pub struct Calculator<'a> {
    model: &'a RnnAdder,
    width: Width,
}

impl<'a> Calculator<'a> {
    pub fn new(model: &'a RnnAdder, width: Width) -> Calculator<'a> {
        Calculator { model, width }
    }

    /// Parses one operand, accepting only integers in `[0, 2^width - 1]`.
    pub fn parse_operand(&self, text: &str) -> Result<u64> {
        let text = text.trim();
        let value: u64 = text.parse().map_err(|_| AdderError::InvalidNumber {
            input: text.to_string(),
        })?;
        let max = self.width.max_value();
        if value > max {
            return Err(AdderError::ValueOutOfRange { value, max });
        }
        Ok(value)
    }

    /// Runs both operands through the network from a zero hidden state.
    pub fn calculate(&self, x0: u64, x1: u64) -> Result<Prediction> {
        let probabilities = self.model.predict_probabilities(x0, x1, self.width)?;
        let bits = round_probabilities(&probabilities);
        let predicted = decode(&bits, self.width)?;
        let expected = modular_sum(x0, x1, self.width);
        tracing::debug!(x0, x1, predicted, expected, "calculator round");
        Ok(Prediction { x0, x1, predicted, expected, bits })
    }

    /// Read-validate-act loop. Returns when the user declines to continue or
    /// input reaches EOF.
    pub fn run<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> io::Result<()> {
        writeln!(
            output,
            "{} adder: enter two integers between 0 and {}.",
            self.width,
            self.width.max_value()
        )?;

        loop {
            let Some(x0) = self.prompt_operand(&mut input, &mut output, "first")? else {
                return Ok(());
            };
            let Some(x1) = self.prompt_operand(&mut input, &mut output, "second")? else {
                return Ok(());
            };

            match self.calculate(x0, x1) {
                Ok(prediction) => write_prediction(&mut output, &prediction)?,
                Err(e) => writeln!(output, "Error: {e}")?,
            }

            write!(output, "Add another pair? [y/n]: ")?;
            output.flush()?;
            match read_line(&mut input)? {
                Some(answer) if is_yes(&answer) => continue,
                _ => {
                    writeln!(output, "Goodbye.")?;
                    return Ok(());
                }
            }
        }
    }

    /// Prompts until a valid operand arrives. `None` on EOF.
    fn prompt_operand<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
        ordinal: &str,
    ) -> io::Result<Option<u64>> {
        loop {
            write!(output, "Enter the {ordinal} number (0-{}): ", self.width.max_value())?;
            output.flush()?;
            let Some(line) = read_line(input)? else {
                return Ok(None);
            };
            match self.parse_operand(&line) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => writeln!(output, "Invalid input: {e}")?,
            }
        }
    }
}

fn write_prediction<W: Write>(output: &mut W, p: &Prediction) -> io::Result<()> {
    writeln!(output, "{} + {}", p.x0, p.x1)?;
    writeln!(output, "Predicted sum: {}", p.predicted)?;
    writeln!(output, "True sum:      {}", p.expected)?;
    writeln!(output, "Predicted bits (MSB first): {}", format_msb_first(&p.bits))?;
    writeln!(output, "{}", if p.is_correct() { "Correct." } else { "Mismatch." })
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
