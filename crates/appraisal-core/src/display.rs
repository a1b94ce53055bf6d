//! Human-readable formatting for the countdown, amounts, and results.
//!
//! These helpers produce the strings a renderer shows. They are pure and
//! hold no state.

use appraisal_types::{EndReason, SessionOutcome};

/// Format remaining seconds as `"MM : SS"`.
pub fn format_clock(secs: u32) -> String {
    format!("{:02} : {:02}", secs / 60, secs % 60)
}

/// Format an amount rounded to a whole number with comma thousands
/// separators, e.g. `12000.0` as `"12,000"`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len().saturating_add(digits.len() / 3));
    for (i, ch) in digits.chars().enumerate() {
        let remaining = digits.len().saturating_sub(i);
        if i > 0 && remaining % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Format an accuracy score with one decimal place.
pub fn format_accuracy(score: f64) -> String {
    format!("{score:.1}")
}

/// End-of-round result text, revealing the target.
pub fn summary_line(outcome: &SessionOutcome, unit: &str) -> String {
    let verb = match outcome.reason {
        EndReason::Manual => "Submitted!",
        EndReason::Timeout => "Time's up!",
    };
    format!(
        "{verb} Your value: {value} {unit} / Difference from appraisal: {diff} {unit} / \
         Accuracy: {accuracy}% (appraised value: {target} {unit})",
        value = format_amount(outcome.submitted_value),
        diff = format_amount(outcome.diff),
        accuracy = format_accuracy(outcome.score),
        target = format_amount(outcome.target_value),
    )
}

#[cfg(test)]
mod tests {
    use appraisal_types::SessionId;

    use super::*;

    #[test]
    fn clock_pads_minutes_and_seconds() {
        assert_eq!(format_clock(60), "01 : 00");
        assert_eq!(format_clock(45), "00 : 45");
        assert_eq!(format_clock(9), "00 : 09");
        assert_eq!(format_clock(0), "00 : 00");
        assert_eq!(format_clock(6000), "100 : 00");
    }

    #[test]
    fn amounts_are_grouped_by_thousands() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(50.0), "50");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1000.0), "1,000");
        assert_eq!(format_amount(12_000.0), "12,000");
        assert_eq!(format_amount(1_234_567.0), "1,234,567");
        assert_eq!(format_amount(-3050.0), "-3,050");
    }

    #[test]
    fn amounts_drop_fraction_digits() {
        assert_eq!(format_amount(2999.6), "3,000");
        assert_eq!(format_amount(0.4), "0");
        assert_eq!(format_amount(-0.4), "0");
    }

    #[test]
    fn accuracy_has_one_decimal() {
        assert_eq!(format_accuracy(99.583_333), "99.6");
        assert_eq!(format_accuracy(100.0), "100.0");
        assert_eq!(format_accuracy(0.0), "0.0");
    }

    #[test]
    fn summary_leads_with_reason_and_reveals_target() {
        let mut outcome = SessionOutcome {
            session_id: SessionId::new(),
            submitted_value: 3050.0,
            target_value: 3000.0,
            diff: 50.0,
            score: 99.583_333,
            reason: EndReason::Manual,
        };
        assert_eq!(
            summary_line(&outcome, "DZC"),
            "Submitted! Your value: 3,050 DZC / Difference from appraisal: 50 DZC / \
             Accuracy: 99.6% (appraised value: 3,000 DZC)"
        );

        outcome.reason = EndReason::Timeout;
        assert!(summary_line(&outcome, "DZC").starts_with("Time's up! "));
    }
}
