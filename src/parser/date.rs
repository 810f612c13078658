// Parser for post dates written as `M/D/YYYY (WeekdayName)`, e.g. `3/1/2024 (Friday)`

use chrono::{Datelike, NaiveDate, Weekday};
use nom::{
    bytes::complete::take_while_m_n,
    character::complete::{alpha1, char, space0},
    combinator::{all_consuming, map_res},
    sequence::{delimited, preceded, tuple},
    IResult,
};

/// Components of a post date before calendar validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostDateParts {
    pub month: u32,
    pub day: u32,
    pub year: i32,
    pub weekday: Weekday,
}

fn digits(min: usize, max: usize) -> impl Fn(&str) -> IResult<&str, &str> {
    move |input: &str| take_while_m_n(min, max, |c: char| c.is_ascii_digit())(input)
}

fn month_or_day(input: &str) -> IResult<&str, u32> {
    map_res(digits(1, 2), str::parse::<u32>)(input)
}

fn year(input: &str) -> IResult<&str, i32> {
    map_res(digits(4, 4), str::parse::<i32>)(input)
}

/// Full English weekday name, case-insensitive
fn weekday_name(input: &str) -> IResult<&str, Weekday> {
    map_res(alpha1, |name: &str| match name.to_ascii_lowercase().as_str() {
        "monday" => Ok(Weekday::Mon),
        "tuesday" => Ok(Weekday::Tue),
        "wednesday" => Ok(Weekday::Wed),
        "thursday" => Ok(Weekday::Thu),
        "friday" => Ok(Weekday::Fri),
        "saturday" => Ok(Weekday::Sat),
        "sunday" => Ok(Weekday::Sun),
        _ => Err(()),
    })(input)
}

/// Parse `M/D/YYYY (Weekday)` into its parts
pub fn post_date_parts(input: &str) -> IResult<&str, PostDateParts> {
    let (input, (month, _, day, _, year, weekday)) = tuple((
        month_or_day,
        char('/'),
        month_or_day,
        char('/'),
        year,
        preceded(char(' '), delimited(char('('), weekday_name, char(')'))),
    ))(input)?;

    Ok((input, PostDateParts { month, day, year, weekday }))
}

/// Parse a post date. Returns `None` for malformed text or impossible dates.
///
/// The weekday name has to be a real weekday but is not checked against the
/// calendar date.
pub fn parse_post_date(text: &str) -> Option<NaiveDate> {
    let (_, parts) = all_consuming(delimited(space0, post_date_parts, space0))(text).ok()?;
    let date = NaiveDate::from_ymd_opt(parts.year, parts.month, parts.day)?;

    if date.weekday() != parts.weekday {
        tracing::debug!(
            "Date '{}' is a {:?}, not {:?} as labelled",
            text.trim(),
            date.weekday(),
            parts.weekday
        );
    }

    Some(date)
}
