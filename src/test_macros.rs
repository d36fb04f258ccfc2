//! Test macros for NonZero newtype wrappers
//!
//! This module provides reusable test macros to reduce boilerplate
//! when testing newtype wrappers around NonZero* types.

/// Generate standard tests for a NonZero newtype wrapper
///
/// # Arguments
/// * `$type_name` - The newtype struct name (e.g., `BaudRate`)
/// * `$default_value` - Expected value of the DEFAULT constant
/// * `$test_value` - A valid non-zero value for testing
///
/// # Generated Tests
/// - `test_default` - Verifies DEFAULT constant value
/// - `test_new_valid` - Tests creating with valid non-zero value
/// - `test_new_zero_rejected` - Verifies zero returns None
/// - `test_clone_equality` - Tests Clone and PartialEq
///
/// # Example
/// ```ignore
/// test_nonzero_newtype!(BaudRate, 115_200, 9600);
/// ```
#[macro_export]
macro_rules! test_nonzero_newtype {
    ($type_name:ident, $default_value:expr, $test_value:expr) => {
        #[test]
        fn test_default() {
            assert_eq!($type_name::DEFAULT.get(), $default_value);
        }

        #[test]
        fn test_new_valid() {
            let value = $type_name::new($test_value).unwrap();
            assert_eq!(value.get(), $test_value);
        }

        #[test]
        fn test_new_zero_rejected() {
            assert!($type_name::new(0).is_none());
        }

        #[test]
        fn test_clone_equality() {
            let val1 = $type_name::new($test_value).unwrap();
            let val2 = val1.clone();
            let val3 = $type_name::new($test_value).unwrap();
            let val4 = $type_name::new($default_value).unwrap();

            assert_eq!(val1, val2);
            assert_eq!(val1, val3);
            assert_ne!(val1, val4);
        }
    };
}

/// Generate FromStr tests for a newtype with FromStr implementation
///
/// # Arguments
/// * `$type_name` - The newtype struct name
/// * `$valid_str` - A valid string to parse
/// * `$expected_value` - Expected value after parsing
/// * `$invalid_str` - An invalid string that should fail to parse
///
/// # Generated Tests
/// - `test_from_str_valid` - Tests parsing valid string
/// - `test_from_str_invalid` - Tests parsing invalid string returns error
///
/// # Example
/// ```ignore
/// test_newtype_from_str!(Port, "443", 443, "https");
/// ```
#[macro_export]
macro_rules! test_newtype_from_str {
    ($type_name:ident, $valid_str:expr, $expected_value:expr, $invalid_str:expr) => {
        #[test]
        fn test_from_str_valid() {
            let value: $type_name = $valid_str.parse().unwrap();
            assert_eq!(value.get(), $expected_value);
        }

        #[test]
        fn test_from_str_invalid() {
            let result: Result<$type_name, _> = $invalid_str.parse();
            assert!(result.is_err());
        }
    };
}
