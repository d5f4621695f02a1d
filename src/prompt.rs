//! Terminal prompts that keep asking until the answer is in range.

use std::io::{self, BufRead, Write};
use std::ops::RangeInclusive;

use crate::config::{self, Settings};

/// Ask for a number in `range`, re-prompting on anything else.
pub fn read_bounded<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
    range: &RangeInclusive<u64>,
) -> io::Result<u64> {
    let mut line = String::new();
    loop {
        write!(output, "{label} ({}-{}): ", range.start(), range.end())?;
        output.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("input ended before {label} was entered"),
            ));
        }
        match line.trim().parse::<u64>() {
            Ok(value) if range.contains(&value) => return Ok(value),
            _ => writeln!(
                output,
                "Invalid value! Must be between {} and {}.",
                range.start(),
                range.end()
            )?,
        }
    }
}

/// Collect every startup input interactively.
pub fn read_settings<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Settings> {
    let waiters = read_bounded(input, output, "Number of waiters", &config::WAITERS)?;
    let chefs = read_bounded(input, output, "Number of chefs", &config::CHEFS)?;
    let max_dishes = read_bounded(
        input,
        output,
        "Max dishes per order",
        &config::MAX_DISHES_PER_ORDER,
    )?;
    let tables = read_bounded(input, output, "Number of tables", &config::TABLES)?;
    let minutes = read_bounded(
        input,
        output,
        "Opening hours in virtual minutes",
        &config::DURATION_MINUTES,
    )?;
    Settings {
        waiters: waiters as usize,
        chefs: chefs as usize,
        max_dishes_per_order: max_dishes as usize,
        tables: tables as u32,
        ..Settings::default()
    }
    .with_duration_minutes(minutes)
    .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    #[test]
    fn reprompts_until_value_in_range() {
        let mut input = Cursor::new("0\nabc\n16\n7\n");
        let mut output = Vec::new();
        let value = read_bounded(&mut input, &mut output, "Waiters", &(1..=15)).expect("value");
        assert_eq!(value, 7);

        let text = String::from_utf8(output).expect("utf8");
        assert_eq!(text.matches("Waiters (1-15): ").count(), 4);
        assert_eq!(text.matches("Invalid value!").count(), 3);
    }

    #[test]
    fn eof_is_an_error() {
        let mut input = Cursor::new("99\n");
        let mut output = Vec::new();
        let err = read_bounded(&mut input, &mut output, "Chefs", &(1..=10)).expect_err("eof");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn reads_full_settings() {
        let mut input = Cursor::new("4\n2\n9\n3\n12\n90\n");
        let mut output = Vec::new();
        let settings = read_settings(&mut input, &mut output).expect("settings");
        assert_eq!(settings.waiters, 4);
        assert_eq!(settings.chefs, 2);
        // 9 was rejected for max dishes, so 3 was used.
        assert_eq!(settings.max_dishes_per_order, 3);
        assert_eq!(settings.tables, 12);
        assert_eq!(settings.duration, Duration::from_secs(90 * 60));
        assert!(settings.validate().is_ok());
    }
}
