use std::{cmp::Ordering, str::FromStr};

use logos::Logos;
use miette::Diagnostic;
use thiserror::Error;
use time::{macros::format_description, Date};

#[derive(Logos, Debug, PartialEq)]
enum Token {
    #[token(",")]
    Comma,

    #[regex(r"[^,\r\n]+")]
    Field,
}

/// Splits one raw line into its comma-separated fields.
///
/// An empty line has no fields at all, a line ending on a comma has a
/// trailing empty field.
fn split_fields(line: &str) -> Vec<&str> {
    if line.is_empty() {
        return Vec::new();
    }

    let mut lexer = Token::lexer(line);
    let mut fields = Vec::new();
    let mut field = "";

    while let Some(token) = lexer.next() {
        match token {
            Ok(Token::Field) => field = lexer.slice(),
            Ok(Token::Comma) => fields.push(std::mem::take(&mut field)),
            Err(()) => continue,
        }
    }
    fields.push(field);

    fields
}

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("Row `{row}` has fewer than 3 fields")]
    TooFewFields { row: String },
    #[error("Bad temperature `{field}` in row `{row}`")]
    BadTemperature {
        field: String,
        row: String,
        source: std::num::ParseIntError,
    },
}

/// One day of forecast data, temperatures in Fahrenheit.
#[derive(Debug, Clone, PartialEq)]
pub struct Day {
    // The calendar date stays a string until it is displayed
    pub date: String,
    pub low_temp: i32,
    pub high_temp: i32,
}

impl Day {
    /// Builds a day from the fields of one row: date, minimum, maximum.
    /// Extra fields are ignored.
    pub fn from_fields(fields: &[&str]) -> Result<Self, ParseError> {
        let (date, low, high) = match fields {
            [date, low, high, ..] => (*date, *low, *high),
            _ => {
                return Err(ParseError::TooFewFields {
                    row: fields.join(","),
                })
            }
        };

        Ok(Self {
            date: date.to_string(),
            low_temp: parse_temperature(low, fields)?,
            high_temp: parse_temperature(high, fields)?,
        })
    }
}

fn parse_temperature(field: &str, row: &[&str]) -> Result<i32, ParseError> {
    field
        .trim()
        .parse()
        .map_err(|source| ParseError::BadTemperature {
            field: field.to_string(),
            row: row.join(","),
            source,
        })
}

#[derive(Debug, Error, Diagnostic)]
pub enum SummaryError {
    #[error(transparent)]
    EmptyInput(#[from] EmptyInputError),
    #[error(transparent)]
    DateFormat(#[from] DateFormatError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    // Days keep their source row order, which day wins a tie depends on it
    pub days: Vec<Day>,
}

impl Forecast {
    /// Builds a forecast from already-split rows, coming from a CSV reader
    /// or similar. The first row is a header and is always discarded, rows
    /// with no fields at all are skipped.
    pub fn from_rows<I, R, S>(rows: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut rows = rows.into_iter();
        // Header row, whatever it contains
        rows.next();

        let mut days = Vec::new();
        for row in rows {
            let fields: Vec<&str> = row.as_ref().iter().map(|field| field.as_ref()).collect();
            if fields.is_empty() {
                continue;
            }
            days.push(Day::from_fields(&fields)?);
        }

        Ok(Self { days })
    }

    /// The minimum temperature column, in row order.
    pub fn low_temps(&self) -> Vec<f64> {
        self.days
            .iter()
            .map(|day| f64::from(day.low_temp))
            .collect()
    }

    /// The maximum temperature column, in row order.
    pub fn high_temps(&self) -> Vec<f64> {
        self.days
            .iter()
            .map(|day| f64::from(day.high_temp))
            .collect()
    }

    /// Renders the aggregate summary: day count, extreme temperatures with
    /// the dates they occur on, and the average low and high.
    ///
    /// An empty forecast has no extremes or averages and is an error.
    pub fn overview(&self) -> Result<String, SummaryError> {
        let lows = self.low_temps();
        let highs = self.high_temps();

        let lowest = find_extremum(&lows, Extreme::Min).ok_or(EmptyInputError)?;
        let highest = find_extremum(&highs, Extreme::Max).ok_or(EmptyInputError)?;

        let mut out = format!("{} Day Overview\n", self.days.len());
        out.push_str(&format!(
            "  The lowest temperature will be {}, and will occur on {}.\n",
            format_temperature(fahrenheit_to_celsius(lowest.value)),
            format_date(&self.days[lowest.index].date)?,
        ));
        out.push_str(&format!(
            "  The highest temperature will be {}, and will occur on {}.\n",
            format_temperature(fahrenheit_to_celsius(highest.value)),
            format_date(&self.days[highest.index].date)?,
        ));
        out.push_str(&format!(
            "  The average low this week is {}.\n",
            format_temperature(fahrenheit_to_celsius(mean(&lows)?)),
        ));
        out.push_str(&format!(
            "  The average high this week is {}.\n",
            format_temperature(fahrenheit_to_celsius(mean(&highs)?)),
        ));

        Ok(out)
    }

    /// Renders one block per day, in row order. An empty forecast renders
    /// as an empty string.
    pub fn daily_breakdown(&self) -> Result<String, SummaryError> {
        let mut out = String::new();
        for day in &self.days {
            out.push_str(&format!(
                "---- {} ----\n  Minimum Temperature: {}\n  Maximum Temperature: {}\n\n",
                format_date(&day.date)?,
                format_temperature(fahrenheit_to_celsius(f64::from(day.low_temp))),
                format_temperature(fahrenheit_to_celsius(f64::from(day.high_temp))),
            ));
        }
        Ok(out)
    }
}

impl FromStr for Forecast {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_rows(s.lines().map(split_fields))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Min,
    Max,
}

/// An extreme value and the position of its last occurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremum {
    pub value: f64,
    pub index: usize,
}

/// Finds the smallest or largest value of a sequence. On ties the last
/// occurrence wins, an empty sequence has no extremum.
pub fn find_extremum(values: &[f64], extreme: Extreme) -> Option<Extremum> {
    let mut best: Option<Extremum> = None;
    for (index, &value) in values.iter().enumerate() {
        let replace = match &best {
            None => true,
            // Ties replace the current best, so the last occurrence wins
            Some(best) => match extreme {
                Extreme::Min => value.total_cmp(&best.value) != Ordering::Greater,
                Extreme::Max => value.total_cmp(&best.value) != Ordering::Less,
            },
        };
        if replace {
            best = Some(Extremum { value, index });
        }
    }
    best
}

#[derive(Debug, Error, Diagnostic)]
#[error("Cannot aggregate an empty sequence")]
pub struct EmptyInputError;

/// Arithmetic mean of a sequence.
pub fn mean(values: &[f64]) -> Result<f64, EmptyInputError> {
    if values.is_empty() {
        return Err(EmptyInputError);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Converts a temperature to Celsius, rounded to one decimal place.
/// Half-way values round to the even tenth.
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    round_to_tenth((fahrenheit - 32.0) * 5.0 / 9.0)
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Renders a temperature with one decimal and the `°C` suffix.
pub fn format_temperature(celsius: f64) -> String {
    format!("{celsius:.1}°C")
}

#[derive(Debug, Error, Diagnostic)]
pub enum DateFormatError {
    #[error("Cannot parse date `{input}`")]
    Unparsable {
        input: String,
        source: time::error::Parse,
    },
    #[error(transparent)]
    Render(#[from] time::error::Format),
}

/// Renders an ISO-8601 calendar date like `Tuesday 06 July 2021`.
///
/// A time component after the calendar date is ignored.
pub fn format_date(iso: &str) -> Result<String, DateFormatError> {
    let calendar = match iso.split_once('T') {
        Some((date, _)) => date,
        None => iso,
    };

    let iso_date = format_description!("[year]-[month]-[day]");
    let date = Date::parse(calendar, &iso_date).map_err(|source| DateFormatError::Unparsable {
        input: iso.to_string(),
        source,
    })?;

    let display = format_description!("[weekday repr:long] [day] [month repr:long] [year]");
    Ok(date.format(&display)?)
}
