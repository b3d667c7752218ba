mod capture;
pub(crate) mod decode;

pub use capture::CaptureLoader;
