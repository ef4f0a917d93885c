//! Required-column check for uploaded transaction tables

use crate::error::DashboardError;

/// Columns every upload must carry; order and extra columns are free
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "Transaction_ID",
    "Amount",
    "Merchant_Category",
    "Transaction_Location",
    "User_Behavior",
];

/// Required columns absent from `headers`, in schema order
pub fn missing_columns<'a, I>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = headers.into_iter().map(str::trim).collect();
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !present.contains(*required))
        .map(|c| c.to_string())
        .collect()
}

/// Pass only if every required column is present
pub fn validate_columns<'a, I>(headers: I) -> Result<(), DashboardError>
where
    I: IntoIterator<Item = &'a str>,
{
    let missing = missing_columns(headers);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DashboardError::MissingColumns { missing })
    }
}
