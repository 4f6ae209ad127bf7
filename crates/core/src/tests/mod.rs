//! Reusable test harnesses for trait implementations
