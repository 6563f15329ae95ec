/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Tables use `{ "key": value }` syntax with string-literal keys; arrays,
/// `null`, booleans, numbers and strings look like themselves. Anything else
/// falls back to [`Value::from`](crate::Value).
///
/// # Examples
///
/// ```rust
/// use zconf::{zconf, Value};
///
/// let config = zconf!({
///     "name": "demo",
///     "port": 8080,
///     "tags": ["a", "b"],
///     "extra": null
/// });
///
/// let table = config.as_table().unwrap();
/// assert_eq!(table.get("port").and_then(Value::as_integer), Some(8080));
/// assert!(table.get("extra").unwrap().is_null());
/// ```
#[macro_export]
macro_rules! zconf {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($element:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::zconf!($element)),*])
    };

    ({}) => {
        $crate::Value::Table($crate::ZconfMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut table = $crate::ZconfMap::new();
        $(
            table.insert($key.to_string(), $crate::zconf!($value));
        )*
        $crate::Value::Table(table)
    }};

    ($other:expr) => {
        $crate::Value::from($other)
    };
}

#[cfg(test)]
mod tests {
    use crate::{Value, ZconfMap};

    #[test]
    fn primitives() {
        assert_eq!(zconf!(null), Value::Null);
        assert_eq!(zconf!(true), Value::Bool(true));
        assert_eq!(zconf!(false), Value::Bool(false));
        assert_eq!(zconf!(42), Value::Integer(42));
        assert_eq!(zconf!(3.5), Value::Float(3.5));
        assert_eq!(zconf!("hello"), Value::String("hello".to_string()));
    }

    #[test]
    fn arrays() {
        assert_eq!(zconf!([]), Value::Array(vec![]));
        let array = zconf!([1, 2, 3]);
        assert_eq!(
            array,
            Value::Array(vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
            ])
        );
    }

    #[test]
    fn tables_nest() {
        assert_eq!(zconf!({}), Value::Table(ZconfMap::new()));
        let value = zconf!({
            "name": "demo",
            "nested": { "flag": true },
        });
        let table = value.as_table().unwrap();
        assert_eq!(table.get("name").and_then(Value::as_str), Some("demo"));
        let nested = table.get("nested").and_then(Value::as_table).unwrap();
        assert_eq!(nested.get("flag").and_then(Value::as_bool), Some(true));
    }
}
