//! Pairing Engine (§4.3): format-specific algorithms, one module per format.
//! Every function here is a pure function of its inputs — it never touches
//! the repository and never mutates what's passed in (§4.3.6). Each format
//! needs a different input shape (a flat roster, quad groupings, team
//! rosters, advancing-player lists), so the Round Controller calls the
//! module matching the tournament's format directly rather than through a
//! single uniform entry point.

pub mod knockout;
pub mod quad;
pub mod round_robin;
pub mod swiss;
pub mod team_swiss;
