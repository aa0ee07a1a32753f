use std::{fs, path::Path};

use nom::{
    branch::alt,
    character::complete::{char, digit1, one_of, space0},
    combinator::{all_consuming, map_res, opt, recognize},
    multi::many1,
    sequence::{preceded, terminated, tuple},
    IResult,
};

use crate::error::{Error, Format, Result};

pub fn decimal(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |out: &str| out.parse::<u32>())(input)
}

fn exponent(input: &str) -> IResult<&str, &str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

/// Signed float in any of the forms written by Fortran `F`/`E` edit
/// descriptors: `.42`, `42.`, `42.42`, `42e-2`, `-4.2E+01` and bare integers.
pub fn float(input: &str) -> IResult<&str, f64> {
    map_res(
        alt((
            // Case one: .42
            recognize(tuple((
                opt(one_of("+-")),
                char('.'),
                digit1,
                opt(exponent),
            ))),
            // Case two: 42e42 and 42.42e42
            recognize(tuple((
                opt(one_of("+-")),
                digit1,
                opt(preceded(char('.'), opt(digit1))),
                exponent,
            ))),
            // Case three: 42. and 42.42
            recognize(tuple((opt(one_of("+-")), digit1, char('.'), opt(digit1)))),
            // Case four: 42
            recognize(tuple((opt(one_of("+-")), digit1))),
        )),
        |out: &str| out.parse::<f64>(),
    )(input)
}

/// One whitespace-separated row of floats, consuming the whole line.
pub fn float_row(line: &str) -> IResult<&str, Vec<f64>> {
    all_consuming(terminated(many1(preceded(space0, float)), space0))(line)
}

/// Parse a row of floats, reporting failures against the 1-based line number.
pub fn parse_float_row(line: &str, format: Format, line_no: usize) -> Result<Vec<f64>> {
    float_row(line)
        .map(|(_, row)| row)
        .map_err(|e| Error::parse(format, line_no, format!("expected a row of numbers: {e}")))
}

pub fn read_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}
