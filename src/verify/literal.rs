//! CQL literal rendering for sampled values.

use crate::interfaces::CqlValue;

/// Quote a string literal, doubling embedded single quotes.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Render a sampled value as a CQL literal usable in a `WHERE` clause.
///
/// Returns `None` for null, which cannot be used in an equality filter.
pub fn to_cql_literal(value: &CqlValue) -> Option<String> {
    let literal = match value {
        CqlValue::Null => return None,
        CqlValue::Text(s) => quote(s),
        CqlValue::Timestamp(ts) => quote(&ts.format("%Y-%m-%d %H:%M:%S%.3f%z").to_string()),
        CqlValue::Date(d) => quote(&d.format("%Y-%m-%d").to_string()),
        CqlValue::Time(t) => quote(&t.format("%H:%M:%S%.9f").to_string()),
        CqlValue::Inet(ip) => quote(&ip.to_string()),
        CqlValue::Blob(bytes) => format!("0x{}", hex::encode(bytes)),
        CqlValue::Int(i) => i.to_string(),
        CqlValue::Double(f) if f.is_nan() => "NaN".to_string(),
        CqlValue::Double(f) if f.is_infinite() => {
            if *f > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
        }
        CqlValue::Double(f) => format!("{:?}", f),
        CqlValue::Boolean(b) => b.to_string(),
        CqlValue::Uuid(u) => u.hyphenated().to_string(),
        CqlValue::Other(raw) => raw.clone(),
    };
    Some(literal)
}
