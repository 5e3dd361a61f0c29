pub mod check;
pub mod ingest;
pub mod review;
pub mod show;
pub mod status;
