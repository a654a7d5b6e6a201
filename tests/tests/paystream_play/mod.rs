mod failures;
mod session;
