/// Service layer
///
/// Operations that span the database and an outbound integration live here
/// so route handlers stay thin.
///
/// - `access`: Access key issuance and redemption
/// - `slack_interactions`: Modal submissions and message button clicks

pub mod access;
pub mod slack_interactions;
