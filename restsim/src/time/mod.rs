mod jiffy;
pub(crate) mod timer_manager;

pub use jiffy::Jiffies;
pub use timer_manager::TimerId;
