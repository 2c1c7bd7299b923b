// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # CNN accelerator FIFO registers
//!
//! Minimal register-level access to the input FIFOs of the fixed-function CNN
//! accelerator. Only the pieces needed to stream an input tensor are exposed:
//! the FIFO status register (bit 0 set while FIFO 0 is full) and the FIFO 0
//! data register.
//!
//! Accelerator bring-up (clocks, weights, bias, state machine) is performed
//! elsewhere; this crate assumes the accelerator is configured and started.
//!
//! ## Safety
//!
//! Register access is performed through volatile reads and writes on a raw
//! base pointer. [`CnnFifo::map`] obtains that pointer by mapping the physical
//! register window through `/dev/mem`, and unmaps it on drop.

use std::{
    ffi::c_void,
    fs::OpenOptions,
    io,
    os::{fd::AsRawFd, unix::fs::OpenOptionsExt},
    path::Path,
    ptr::{null_mut, read_volatile, write_volatile},
};

/// Physical base address of the accelerator FIFO control block.
pub const CNN_FIFO_BASE: usize = 0x5000_0000;

/// FIFO control register offset.
pub const FIFO_CTRL: usize = 0x00;

/// FIFO status register offset.
pub const FIFO_STAT: usize = 0x04;

/// FIFO 0 write register offset.
pub const FIFO_DATA0: usize = 0x08;

/// Status bit set while FIFO 0 cannot accept another word.
pub const FIFO_STAT_FULL0: u32 = 1 << 0;

/// Size of the register window covering the registers above.
pub const FIFO_WINDOW: usize = 0x10;

struct Mapping {
    addr: *mut c_void,
    len: usize,
}

impl Drop for Mapping {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.addr, self.len);
        }
    }
}

/// Volatile accessor for the accelerator's FIFO 0.
pub struct CnnFifo {
    base: *mut u32,
    _mapping: Option<Mapping>,
}

// The accessor owns its register window exclusively.
unsafe impl Send for CnnFifo {}

impl CnnFifo {
    /// Wraps an already mapped register block.
    ///
    /// # Safety
    ///
    /// `base` must point to at least [`FIFO_WINDOW`] bytes of readable and
    /// writable memory, aligned for `u32`, that stays valid for the lifetime
    /// of the returned accessor.
    pub unsafe fn from_ptr(base: *mut u32) -> Self {
        Self {
            base,
            _mapping: None,
        }
    }

    /// Maps the FIFO register block at physical address `phys` through the
    /// memory device at `path` (usually `/dev/mem`).
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be opened or `mmap` fails.
    pub fn map(path: impl AsRef<Path>, phys: usize) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(path)?;

        let page = match unsafe { libc::sysconf(libc::_SC_PAGESIZE) } {
            n if n > 0 => n as usize,
            _ => 4096,
        };
        let page_base = phys & !(page - 1);
        let offset = phys - page_base;
        let len = offset + FIFO_WINDOW;

        let addr = unsafe {
            libc::mmap(
                null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                page_base as libc::off_t,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        let base = unsafe { addr.cast::<u8>().add(offset).cast::<u32>() };
        Ok(Self {
            base,
            _mapping: Some(Mapping { addr, len }),
        })
    }

    /// Raw value of the FIFO status register.
    pub fn status(&self) -> u32 {
        unsafe { read_volatile(self.base.add(FIFO_STAT / 4)) }
    }

    pub fn is_full(&self) -> bool {
        self.status() & FIFO_STAT_FULL0 != 0
    }

    /// Writes one word into FIFO 0 without checking the full flag.
    pub fn write(&mut self, word: u32) {
        unsafe { write_volatile(self.base.add(FIFO_DATA0 / 4), word) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_write() {
        let mut regs = [0u32; FIFO_WINDOW / 4];
        let mut fifo = unsafe { CnnFifo::from_ptr(regs.as_mut_ptr()) };

        assert!(!fifo.is_full());
        fifo.write(0x0012_3456);

        regs[FIFO_STAT / 4] = FIFO_STAT_FULL0;
        let fifo = unsafe { CnnFifo::from_ptr(regs.as_mut_ptr()) };
        assert!(fifo.is_full());
        assert_eq!(regs[FIFO_DATA0 / 4], 0x0012_3456);
    }
}
