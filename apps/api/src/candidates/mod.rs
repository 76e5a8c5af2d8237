// Candidate intake and query API.
// Upload: validate → extract text → store file → model extraction → persist.
// Query: look up a stored candidate, answer questions about it.

pub mod handlers;
pub mod query;
pub mod upload;
