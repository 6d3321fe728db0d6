//! Panic payload formatting.
//!
//! Step handlers may panic with any payload. This module turns the payload
//! into the text reported in a failed action reply.

use std::any::Any;

/// Format a panic payload into a readable message.
///
/// String payloads are extracted directly and common primitives are rendered
/// with `Display`; any other payload is described by its `Debug` output.
///
/// # Examples
///
/// ```
/// use stepbridge::panic_message;
/// use std::any::Any;
///
/// let payload: Box<dyn Any + Send> = Box::new("boom");
/// assert_eq!(panic_message(payload.as_ref()), "boom");
/// ```
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    macro_rules! try_downcast {
        ($($ty:ty),* $(,)?) => {
            $(
                if let Some(value) = payload.downcast_ref::<$ty>() {
                    return value.to_string();
                }
            )*
        };
    }

    try_downcast!(&str, String, i32, u32, i64, u64, isize, usize, f32, f64, bool);
    format!("{payload:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Box::new("boom"), "boom")]
    #[case(Box::new(String::from("owned")), "owned")]
    #[case(Box::new(42_u64), "42")]
    #[case(Box::new(false), "false")]
    fn known_payloads_render_with_display(
        #[case] payload: Box<dyn Any + Send>,
        #[case] expected: &str,
    ) {
        assert_eq!(panic_message(payload.as_ref()), expected);
    }

    #[test]
    fn captured_panic_message_is_extracted() {
        let outcome: std::thread::Result<()> =
            std::panic::catch_unwind(|| panic!("handler exploded"));
        let Err(payload) = outcome else {
            panic!("expected the closure to panic");
        };
        assert_eq!(panic_message(payload.as_ref()), "handler exploded");
    }

    #[test]
    fn unknown_payload_falls_back_to_debug() {
        let payload: Box<dyn Any + Send> = Box::new(vec![1_u8]);
        assert_eq!(panic_message(payload.as_ref()), "Any { .. }");
    }
}
