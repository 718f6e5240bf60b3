//! Persistence for courses, enrollments, progress and the signed-in session.

#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;
