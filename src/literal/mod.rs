//! # Literal Value System
//!
//! The tagged union of term kinds the rowsource framework, expression
//! evaluator and comparison engine exchange (spec §3, §6): URI reference,
//! blank-node identifier, plain/typed/language-tagged string, integer,
//! decimal, float, double, boolean, date, dateTime, a catch-all
//! user-defined-type literal, a property-path pattern, and a variable
//! reference.
//!
//! Literals are immutable once constructed and reference-counted via
//! `Rc<str>` for their lexical payload, so cloning a `Literal` never
//! deep-copies the string data — this is the "small-value semantics"
//! design note in spec §9.
//!
//! ## Usage
//!
//! ```rust
//! use rowsource_engine::literal::{Literal, CompareFlags};
//!
//! let a = Literal::integer(1);
//! let b = Literal::integer(2);
//! assert!(a.compare(&b, CompareFlags::default()).unwrap().is_lt());
//! ```

mod decimal;
pub mod xsd_datetime;

pub use decimal::Decimal;
pub use xsd_datetime::{XsdDate, XsdDateTime};

use crate::error::TypeError;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// Flags controlling cross-type and cross-kind comparison, mirroring the
/// "XQuery+URI flags" / "SPARQL URI-aware comparison" default mentioned
/// throughout spec §4.7 and §4.9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareFlags {
    /// When true, two URI literals compare equal only by exact string
    /// match (the SPARQL default); when false, URIs are never
    /// order-comparable to each other (only equality is defined).
    pub uri_aware: bool,
    /// When true, unequal numeric types may be compared after promotion
    /// (integer/decimal/float/double). When false, only same-kind
    /// numeric comparisons are allowed.
    pub numeric_promotion: bool,
}

impl Default for CompareFlags {
    fn default() -> Self {
        CompareFlags {
            uri_aware: true,
            numeric_promotion: true,
        }
    }
}

/// A single RDF/XSD term value.
#[derive(Debug, Clone)]
pub enum Literal {
    Uri(Rc<str>),
    Blank(Rc<str>),
    /// A plain, language-tagged, or datatyped string. `datatype` is
    /// `None` for plain/language strings and `Some` for `^^<type>`
    /// strings that aren't one of the specially-typed variants below.
    Str {
        lexical: Rc<str>,
        lang: Option<Rc<str>>,
        datatype: Option<Rc<str>>,
    },
    Integer(i64),
    Decimal(Decimal),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Date(XsdDate),
    DateTime(XsdDateTime),
    /// A typed literal whose datatype the engine has no dedicated
    /// numeric/calendar representation for. Equality and ordering fall
    /// back to lexical-form comparison scoped to a matching datatype.
    Udt { lexical: Rc<str>, datatype: Rc<str> },
    /// A property-path / regex pattern literal.
    Pattern(Rc<str>),
    /// A reference to another variable, used when an expression needs to
    /// carry a variable name as a value (e.g. `?x` appearing where a
    /// term is expected before binding).
    VariableRef(Rc<str>),
}

impl Literal {
    pub fn uri(s: impl Into<Rc<str>>) -> Self {
        Literal::Uri(s.into())
    }

    pub fn blank(s: impl Into<Rc<str>>) -> Self {
        Literal::Blank(s.into())
    }

    pub fn plain_string(s: impl Into<Rc<str>>) -> Self {
        Literal::Str {
            lexical: s.into(),
            lang: None,
            datatype: None,
        }
    }

    pub fn lang_string(s: impl Into<Rc<str>>, lang: impl Into<Rc<str>>) -> Self {
        Literal::Str {
            lexical: s.into(),
            lang: Some(lang.into()),
            datatype: None,
        }
    }

    pub fn integer(v: i64) -> Self {
        Literal::Integer(v)
    }

    pub fn boolean(v: bool) -> Self {
        Literal::Boolean(v)
    }

    /// A short, stable name for the literal's kind, used in diagnostics
    /// and `NotComparable` error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::Uri(_) => "uri",
            Literal::Blank(_) => "blank",
            Literal::Str { .. } => "string",
            Literal::Integer(_) => "integer",
            Literal::Decimal(_) => "decimal",
            Literal::Float(_) => "float",
            Literal::Double(_) => "double",
            Literal::Boolean(_) => "boolean",
            Literal::Date(_) => "date",
            Literal::DateTime(_) => "dateTime",
            Literal::Udt { .. } => "udt",
            Literal::Pattern(_) => "pattern",
            Literal::VariableRef(_) => "variableRef",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Literal::Integer(_) | Literal::Decimal(_) | Literal::Float(_) | Literal::Double(_)
        )
    }

    /// Canonical lexical form, per literal kind.
    pub fn as_string(&self) -> String {
        match self {
            Literal::Uri(s) | Literal::Blank(s) | Literal::Pattern(s) | Literal::VariableRef(s) => {
                s.to_string()
            }
            Literal::Str { lexical, .. } => lexical.to_string(),
            Literal::Integer(i) => i.to_string(),
            Literal::Decimal(d) => d.to_string(),
            Literal::Float(f) => f.to_string(),
            Literal::Double(d) => d.to_string(),
            Literal::Boolean(b) => b.to_string(),
            Literal::Date(d) => d.to_canonical_string(),
            Literal::DateTime(dt) => dt.to_canonical_string(),
            Literal::Udt { lexical, .. } => lexical.to_string(),
        }
    }

    /// SPARQL "effective boolean value" coercion. Non-boolean literals
    /// coerce per the XQuery EBV rules; values that have no EBV (URIs,
    /// blank nodes, dates) are a type error, which filter evaluation
    /// (spec §4.3) treats as `false`, not a fatal error.
    pub fn as_boolean(&self) -> Result<bool, TypeError> {
        match self {
            Literal::Boolean(b) => Ok(*b),
            Literal::Integer(i) => Ok(*i != 0),
            Literal::Decimal(d) => Ok(!d.is_zero()),
            Literal::Float(f) => Ok(*f != 0.0 && !f.is_nan()),
            Literal::Double(d) => Ok(*d != 0.0 && !d.is_nan()),
            Literal::Str { lexical, datatype: None, .. } => Ok(!lexical.is_empty()),
            other => Err(TypeError::CoercionFailed(format!(
                "{} has no effective boolean value",
                other.kind_name()
            ))),
        }
    }

    pub fn as_integer(&self) -> Result<i64, TypeError> {
        match self {
            Literal::Integer(i) => Ok(*i),
            Literal::Decimal(d) => d
                .to_integer()
                .ok_or_else(|| TypeError::CoercionFailed("decimal has a fractional part".into())),
            Literal::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
            Literal::Double(d) if d.fract() == 0.0 => Ok(*d as i64),
            other => Err(TypeError::CoercionFailed(format!(
                "{} cannot be coerced to integer",
                other.kind_name()
            ))),
        }
    }

    pub fn as_double(&self) -> Result<f64, TypeError> {
        match self {
            Literal::Integer(i) => Ok(*i as f64),
            Literal::Decimal(d) => Ok(d.to_f64()),
            Literal::Float(f) => Ok(*f as f64),
            Literal::Double(d) => Ok(*d),
            other => Err(TypeError::CoercionFailed(format!(
                "{} cannot be coerced to double",
                other.kind_name()
            ))),
        }
    }

    /// Value-space equality per XQuery rules (spec §3). Distinct from
    /// `compare`: equality is total across comparable kinds (and always
    /// `false` across incomparable ones), while ordering may error.
    pub fn value_equals(&self, other: &Literal, flags: CompareFlags) -> bool {
        self.compare(other, flags).map(|o| o == Ordering::Equal).unwrap_or(false)
    }

    /// Order two literals per the XQuery/XPath promotion rules embedded
    /// in this type (spec §4.10, §9). Numeric kinds promote to a common
    /// representation; strings compare byte-for-byte; dates/dateTimes
    /// compare on their normalized calendar tuple; URIs/blank
    /// nodes/patterns compare by exact string equality only (ordering
    /// beyond equality is not meaningful and is reported as
    /// `NotComparable` so callers don't rely on an arbitrary order).
    pub fn compare(&self, other: &Literal, flags: CompareFlags) -> Result<Ordering, TypeError> {
        use Literal::*;
        match (self, other) {
            (Uri(a), Uri(b)) => {
                if flags.uri_aware {
                    Ok(a.cmp(b))
                } else {
                    Err(TypeError::NotComparable {
                        left: "uri".into(),
                        right: "uri".into(),
                    })
                }
            }
            (Blank(a), Blank(b)) => Ok(a.cmp(b)),
            (Pattern(a), Pattern(b)) | (VariableRef(a), VariableRef(b)) => Ok(a.cmp(b)),
            (Boolean(a), Boolean(b)) => Ok(a.cmp(b)),
            (
                Str { lexical: la, lang: lla, datatype: da },
                Str { lexical: lb, lang: llb, datatype: db },
            ) => {
                if lla == llb && da == db {
                    Ok(la.as_bytes().cmp(lb.as_bytes()))
                } else if la == lb {
                    Ok(Ordering::Equal)
                } else {
                    Err(TypeError::NotComparable {
                        left: "string".into(),
                        right: "string".into(),
                    })
                }
            }
            (Udt { lexical: la, datatype: da }, Udt { lexical: lb, datatype: db }) => {
                if da == db {
                    Ok(la.as_bytes().cmp(lb.as_bytes()))
                } else {
                    Err(TypeError::NotComparable {
                        left: da.to_string(),
                        right: db.to_string(),
                    })
                }
            }
            (Date(a), Date(b)) => Ok(a.compare(b)),
            (DateTime(a), DateTime(b)) => Ok(a.compare(b)),
            (Integer(a), Integer(b)) => Ok(a.cmp(b)),
            (Decimal(a), Decimal(b)) => Ok(a.compare(b)),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                if flags.numeric_promotion || std::mem::discriminant(a) == std::mem::discriminant(b) {
                    let (x, y) = (a.as_double()?, b.as_double()?);
                    x.partial_cmp(&y).ok_or(TypeError::NotComparable {
                        left: a.kind_name().into(),
                        right: b.kind_name().into(),
                    })
                } else {
                    Err(TypeError::NotComparable {
                        left: a.kind_name().into(),
                        right: b.kind_name().into(),
                    })
                }
            }
            (a, b) => Err(TypeError::NotComparable {
                left: a.kind_name().into(),
                right: b.kind_name().into(),
            }),
        }
    }

    /// Numeric addition with XSD/XPath type promotion, used by SUM.
    pub fn add(&self, other: &Literal) -> Result<Literal, TypeError> {
        numeric_op(self, other, "add", |a, b| a.checked_add(b), |a, b| a.add(b), |a, b| a + b, |a, b| a + b)
    }

    /// Numeric subtraction with the same Integer/Decimal-preserving
    /// promotion as `add`.
    pub fn subtract(&self, other: &Literal) -> Result<Literal, TypeError> {
        numeric_op(
            self,
            other,
            "subtract",
            |a, b| a.checked_sub(b),
            |a, b| a.subtract(b),
            |a, b| a - b,
            |a, b| a - b,
        )
    }

    /// Numeric multiplication with the same Integer/Decimal-preserving
    /// promotion as `add`.
    pub fn multiply(&self, other: &Literal) -> Result<Literal, TypeError> {
        numeric_op(
            self,
            other,
            "multiply",
            |a, b| a.checked_mul(b),
            |a, b| a.multiply(b),
            |a, b| a * b,
            |a, b| a * b,
        )
    }

    /// Numeric division with XSD/XPath type promotion, used by AVG.
    pub fn divide(&self, other: &Literal) -> Result<Literal, TypeError> {
        match (self, other) {
            (_, Literal::Integer(0)) => Err(TypeError::DivisionByZero),
            (Literal::Integer(a), Literal::Integer(b)) => {
                // XSD integer division promotes to decimal (exact result, not truncated).
                Ok(Literal::Decimal(Decimal::from_i64(*a).divide(&Decimal::from_i64(*b))?))
            }
            (Literal::Decimal(a), Literal::Decimal(b)) => Ok(Literal::Decimal(a.divide(b)?)),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                let y = b.as_double()?;
                if y == 0.0 {
                    return Err(TypeError::DivisionByZero);
                }
                Ok(Literal::Double(a.as_double()? / y))
            }
            (a, b) => Err(TypeError::UnsupportedOperation {
                op: "divide".into(),
                ty: format!("{}/{}", a.kind_name(), b.kind_name()),
            }),
        }
    }
}

fn numeric_op(
    a: &Literal,
    b: &Literal,
    op: &str,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    dec_op: impl Fn(&Decimal, &Decimal) -> Result<Decimal, TypeError>,
    f32_op: impl Fn(f32, f32) -> f32,
    f64_op: impl Fn(f64, f64) -> f64,
) -> Result<Literal, TypeError> {
    use Literal::*;
    match (a, b) {
        (Integer(x), Integer(y)) => int_op(*x, *y)
            .map(Integer)
            .ok_or_else(|| TypeError::Overflow { op: op.to_string() }),
        (Decimal(x), Decimal(y)) => dec_op(x, y).map(Literal::Decimal),
        (Integer(x), Decimal(y)) | (Decimal(y), Integer(x)) => {
            dec_op(&Decimal::from_i64(*x), y).map(Literal::Decimal)
        }
        (Float(x), Float(y)) => Ok(Float(f32_op(*x, *y))),
        (x, y) if x.is_numeric() && y.is_numeric() => {
            Ok(Double(f64_op(x.as_double()?, y.as_double()?)))
        }
        (x, y) => Err(TypeError::UnsupportedOperation {
            op: op.to_string(),
            ty: format!("{}/{}", x.kind_name(), y.kind_name()),
        }),
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_equality_and_order() {
        let a = Literal::integer(1);
        let b = Literal::integer(2);
        assert!(!a.value_equals(&b, CompareFlags::default()));
        assert_eq!(a.compare(&b, CompareFlags::default()).unwrap(), Ordering::Less);
    }

    #[test]
    fn uri_requires_uri_aware_flag_for_ordering() {
        let a = Literal::uri("http://a");
        let b = Literal::uri("http://b");
        let flags = CompareFlags {
            uri_aware: false,
            ..CompareFlags::default()
        };
        assert!(a.compare(&b, flags).is_err());
        assert!(a.compare(&b, CompareFlags::default()).is_ok());
    }

    #[test]
    fn mismatched_kinds_are_not_comparable() {
        let a = Literal::uri("http://a");
        let b = Literal::integer(1);
        assert!(matches!(
            a.compare(&b, CompareFlags::default()),
            Err(TypeError::NotComparable { .. })
        ));
    }

    #[test]
    fn effective_boolean_value_of_zero_is_false() {
        assert_eq!(Literal::integer(0).as_boolean().unwrap(), false);
        assert_eq!(Literal::integer(1).as_boolean().unwrap(), true);
    }

    #[test]
    fn effective_boolean_value_is_type_error_for_uri() {
        assert!(Literal::uri("http://a").as_boolean().is_err());
    }

    #[test]
    fn integer_division_promotes_to_decimal() {
        let result = Literal::integer(1).divide(&Literal::integer(2)).unwrap();
        match result {
            Literal::Decimal(d) => assert_eq!(d.to_string(), "0.5"),
            other => panic!("expected decimal, got {other:?}"),
        }
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert!(matches!(
            Literal::integer(1).divide(&Literal::integer(0)),
            Err(TypeError::DivisionByZero)
        ));
    }

    #[test]
    fn add_promotes_integer_and_decimal() {
        let sum = Literal::integer(2).add(&Literal::Decimal(Decimal::from_str("0.5").unwrap())).unwrap();
        match sum {
            Literal::Decimal(d) => assert_eq!(d.to_string(), "2.5"),
            other => panic!("expected decimal, got {other:?}"),
        }
    }

    #[test]
    fn subtract_keeps_integer_exact() {
        let diff = Literal::integer(5).subtract(&Literal::integer(3)).unwrap();
        match diff {
            Literal::Integer(i) => assert_eq!(i, 2),
            other => panic!("expected integer, got {other:?}"),
        }
    }

    #[test]
    fn multiply_keeps_integer_exact() {
        let product = Literal::integer(2).multiply(&Literal::integer(3)).unwrap();
        match product {
            Literal::Integer(i) => assert_eq!(i, 6),
            other => panic!("expected integer, got {other:?}"),
        }
    }

    #[test]
    fn subtract_promotes_integer_and_decimal() {
        let diff = Literal::integer(3).subtract(&Literal::Decimal(Decimal::from_str("0.5").unwrap())).unwrap();
        match diff {
            Literal::Decimal(d) => assert_eq!(d.to_string(), "2.5"),
            other => panic!("expected decimal, got {other:?}"),
        }
    }

    #[test]
    fn multiply_promotes_integer_and_decimal() {
        let product = Literal::integer(2).multiply(&Literal::Decimal(Decimal::from_str("1.5").unwrap())).unwrap();
        match product {
            Literal::Decimal(d) => assert_eq!(d.to_string(), "3.0"),
            other => panic!("expected decimal, got {other:?}"),
        }
    }

    #[test]
    fn lang_tagged_strings_only_equal_with_matching_tag() {
        let a = Literal::lang_string("hello", "en");
        let b = Literal::lang_string("hello", "fr");
        assert!(a.compare(&b, CompareFlags::default()).is_err());
    }
}
