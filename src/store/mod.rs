//! SQL access for each record type. Functions take a plain `&Connection`
//! (a `Transaction` derefs to one) and never open transactions themselves;
//! callers in `records` decide the transaction boundary.

pub mod attendance;
pub mod exams;
pub mod fees;
pub mod students;
pub mod users;
