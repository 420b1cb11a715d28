pub(crate) mod assets;
pub(crate) mod autopilot;
pub(crate) mod bootstrap;
pub(crate) mod loop_runner;
pub(crate) mod metrics;
pub(crate) mod paths;
