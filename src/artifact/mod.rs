//! Build artifacts - initramfs and unified EFI image creation.
//!
//! Both builders run an external tool synchronously against the scratch
//! area and hand the resulting path to the retention layer:
//! - `initramfs` - dracut wrapper
//! - `uki` - objcopy wrapper gluing kernel + initramfs + cmdline onto an
//!   EFI stub

pub mod initramfs;
pub mod uki;
