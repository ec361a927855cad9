/// Canonical column names every standardized table carries.
pub const DATE: &str = "Date";
pub const REVENUE: &str = "Revenue";
pub const EXPENSES: &str = "Expenses";

// "sale" also matches "sales".
const DATE_HINTS: &[&str] = &["date", "month", "period"];
const REVENUE_HINTS: &[&str] = &["revenue", "sale", "amount"];
const EXPENSE_HINTS: &[&str] = &["expense", "cost"];

/// Classify one header name against the recognition rules.
///
/// The trimmed, lower-cased name is tested for hint substrings in fixed
/// precedence: Date, then Revenue, then Expenses. The canonical names are
/// fixed points of this classification ("Date" contains "date", and so on),
/// which is what makes standardization idempotent.
pub fn canonical_for(header: &str) -> Option<&'static str> {
    let lower = header.trim().to_lowercase();
    if DATE_HINTS.iter().any(|hint| lower.contains(hint)) {
        Some(DATE)
    } else if REVENUE_HINTS.iter().any(|hint| lower.contains(hint)) {
        Some(REVENUE)
    } else if EXPENSE_HINTS.iter().any(|hint| lower.contains(hint)) {
        Some(EXPENSES)
    } else {
        None
    }
}
