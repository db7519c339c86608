mod boot;
mod hart;
mod payload;
pub mod shutdown;
mod topology;

pub use boot::open_boot_gate;
pub use hart::{MachineHart, hart_id};
pub use payload::image as payload_image;
pub use topology::hart_count;
