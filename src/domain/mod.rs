pub mod alert;
pub mod center;
pub mod metrics;
pub mod rule;

pub use alert::*;
pub use center::*;
pub use metrics::*;
pub use rule::*;
