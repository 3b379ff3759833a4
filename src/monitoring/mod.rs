/*!
 * Monitoring Module
 * Scheduler events, their distribution, and log setup
 */

pub mod bus;
pub mod events;
pub mod tracer;

pub use bus::EventBus;
pub use events::SchedulerEvent;
pub use tracer::init_tracing;
