// Userspace debugger
#[macro_export]
macro_rules! debug_process {
    ($($arg:tt)+) => {
        log::debug!("[Now: {} | P{}] {}", $crate::now(), $crate::rank(), format_args!($($arg)+));
    }
}

#[macro_export]
macro_rules! info_process {
    ($($arg:tt)+) => {
        log::info!("[Now: {} | P{}] {}", $crate::now(), $crate::rank(), format_args!($($arg)+));
    }
}

#[macro_export]
macro_rules! warn_process {
    ($($arg:tt)+) => {
        log::warn!("[Now: {} | P{}] {}", $crate::now(), $crate::rank(), format_args!($($arg)+));
    }
}
