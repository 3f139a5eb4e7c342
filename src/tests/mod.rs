//! Scenario tests for the object model: construction and validation,
//! property access, dispatch order, next-method chaining, unions, and
//! interop with legacy single-dispatch systems.

mod test_construction;
mod test_next_method;
