//! printf-style expansion for deferred `Format` values
//!
//! Supports the verbs `%v %s %d %x %X %o %b %c %q %t %f %e %g %%`, the
//! flags `-` and `0`, a field width and a precision. Problems are reported
//! inline (`%!d(MISSING)`, `%!(EXTRA ...)`, `%!(BADPREC)`) rather than as
//! errors.

use super::value::{go_quote, Value};

/// Largest width accepted from a template.
const MAX_WIDTH: usize = 1_000_000;

/// Largest precision accepted from a template; `format!` rejects more.
const MAX_PRECISION: usize = u16::MAX as usize;

struct Spec {
    left: bool,
    zero: bool,
    plus: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// Expand `template` with `args`.
pub fn sprintf(template: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut chars = template.chars().peekable();
    let mut next_arg = 0usize;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = Spec {
            left: false,
            zero: false,
            plus: false,
            width: None,
            precision: None,
        };

        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.left = true,
                '0' => spec.zero = true,
                '+' => spec.plus = true,
                ' ' | '#' => {}
                _ => break,
            }
            chars.next();
        }

        spec.width = take_number(&mut chars);
        if spec.width.is_some_and(|w| w > MAX_WIDTH) {
            out.push_str("%!(BADWIDTH)");
            spec.width = None;
        }

        if chars.peek() == Some(&'.') {
            chars.next();
            let precision = take_number(&mut chars).unwrap_or(0);
            if precision > MAX_PRECISION {
                out.push_str("%!(BADPREC)");
            } else {
                spec.precision = Some(precision);
            }
        }

        let verb = match chars.next() {
            Some(v) => v,
            None => {
                out.push_str("%!(NOVERB)");
                break;
            }
        };

        if verb == '%' {
            out.push('%');
            continue;
        }

        let Some(arg) = args.get(next_arg) else {
            out.push_str(&format!("%!{}(MISSING)", verb));
            continue;
        };
        next_arg += 1;

        let body = match format_verb(verb, &spec, arg) {
            Some(body) => body,
            None => {
                out.push_str(&format!("%!{}({})", verb, arg.plain_text()));
                continue;
            }
        };
        pad_into(&mut out, &body, &spec, is_numeric_verb(verb));
    }

    if next_arg < args.len() {
        let extra: Vec<String> = args[next_arg..].iter().map(Value::plain_text).collect();
        out.push_str(&format!("%!(EXTRA {})", extra.join(", ")));
    }

    out
}

/// Read a run of digits; saturates instead of overflowing.
fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut number: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        let n = number.unwrap_or(0);
        number = Some(n.saturating_mul(10).saturating_add(d as usize));
        chars.next();
    }
    number
}

fn is_numeric_verb(verb: char) -> bool {
    matches!(verb, 'd' | 'x' | 'X' | 'o' | 'b' | 'f' | 'e' | 'g')
}

fn integer_of(arg: &Value) -> Option<i128> {
    match arg {
        Value::Int(i) | Value::Hex(i) | Value::Octal(i) | Value::Binary(i) => Some(*i as i128),
        Value::Uint(u) => Some(*u as i128),
        _ => None,
    }
}

fn float_of(arg: &Value) -> Option<f64> {
    match arg {
        Value::Float(f) => Some(*f),
        Value::Int(i) => Some(*i as f64),
        Value::Uint(u) => Some(*u as f64),
        _ => None,
    }
}

fn signed(negative: bool, plus: bool, digits: String) -> String {
    if negative {
        format!("-{}", digits)
    } else if plus {
        format!("+{}", digits)
    } else {
        digits
    }
}

fn format_verb(verb: char, spec: &Spec, arg: &Value) -> Option<String> {
    match verb {
        'v' | 's' => {
            let text = arg.plain_text();
            Some(match spec.precision {
                Some(p) if verb == 's' => text.chars().take(p).collect(),
                _ => text,
            })
        }
        'q' => Some(go_quote(&arg.plain_text())),
        't' => match arg {
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        },
        'c' => integer_of(arg)
            .and_then(|i| u32::try_from(i).ok())
            .and_then(char::from_u32)
            .map(String::from),
        'd' => integer_of(arg).map(|i| signed(i < 0, spec.plus, i.unsigned_abs().to_string())),
        'x' | 'X' => {
            if let Some(i) = integer_of(arg) {
                let digits = format!("{:x}", i.unsigned_abs());
                let digits = if verb == 'X' { digits.to_uppercase() } else { digits };
                return Some(signed(i < 0, spec.plus, digits));
            }
            match arg {
                Value::String(s) | Value::Raw(s) => {
                    let hex: String = s.bytes().map(|b| format!("{:02x}", b)).collect();
                    Some(if verb == 'X' { hex.to_uppercase() } else { hex })
                }
                _ => None,
            }
        }
        'o' => integer_of(arg).map(|i| signed(i < 0, spec.plus, format!("{:o}", i.unsigned_abs()))),
        'b' => integer_of(arg).map(|i| signed(i < 0, spec.plus, format!("{:b}", i.unsigned_abs()))),
        'f' => float_of(arg).map(|f| {
            let body = format!("{:.*}", spec.precision.unwrap_or(6), f.abs());
            signed(f.is_sign_negative() && f != 0.0, spec.plus, body)
        }),
        'e' => float_of(arg).map(|f| {
            let body = exponent_form(f.abs(), spec.precision.unwrap_or(6));
            signed(f.is_sign_negative() && f != 0.0, spec.plus, body)
        }),
        'g' => float_of(arg).map(|f| match spec.precision {
            Some(p) => format!("{:.*}", p, f),
            None => f.to_string(),
        }),
        _ => None,
    }
}

/// `1.500000e+02` style: mantissa plus a signed, two-digit exponent.
fn exponent_form(f: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, f);
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => raw,
    }
}

fn pad_into(out: &mut String, body: &str, spec: &Spec, numeric: bool) {
    let len = body.chars().count();
    let width = spec.width.unwrap_or(0);
    if len >= width {
        out.push_str(body);
        return;
    }

    let fill = width - len;
    if spec.left {
        out.push_str(body);
        out.extend(std::iter::repeat(' ').take(fill));
    } else if spec.zero && numeric {
        let (sign, digits) = match body.strip_prefix(['-', '+']) {
            Some(rest) => (&body[..1], rest),
            None => ("", body),
        };
        out.push_str(sign);
        out.extend(std::iter::repeat('0').take(fill));
        out.push_str(digits);
    } else {
        out.extend(std::iter::repeat(' ').take(fill));
        out.push_str(body);
    }
}
