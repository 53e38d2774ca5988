//! `defmt::Logger` that writes frames to UART0.
//! Based on the `defmt-rtt` implementation, see
//! [0.3.2](https://docs.rs/defmt-rtt/0.3.2/src/defmt_rtt/lib.rs.html#35-83)

use core::{
    ptr::addr_of_mut,
    sync::atomic::{AtomicBool, Ordering},
};

use cortex_m::{interrupt, register};

use crate::LOG_UART;

#[defmt::global_logger]
struct UartLogger;

/// Global logger lock.
static TAKEN: AtomicBool = AtomicBool::new(false);
static INTERRUPTS_ACTIVE: AtomicBool = AtomicBool::new(false);
static mut ENCODER: defmt::Encoder = defmt::Encoder::new();

unsafe impl defmt::Logger for UartLogger {
    fn acquire() {
        let primask = register::primask::read();
        // SAFETY: paired with the enable in release()
        interrupt::disable();

        if TAKEN.load(Ordering::Relaxed) {
            panic!("defmt logger taken reentrantly")
        }

        // interrupts are off, a plain store is enough
        TAKEN.store(true, Ordering::Relaxed);
        INTERRUPTS_ACTIVE.store(primask.is_active(), Ordering::Relaxed);

        // SAFETY: interrupts are disabled and the lock is held
        unsafe { (*addr_of_mut!(ENCODER)).start_frame(do_write) }
    }

    unsafe fn flush() {
        // writes are blocking, nothing is buffered
    }

    unsafe fn release() {
        (*addr_of_mut!(ENCODER)).end_frame(do_write);

        TAKEN.store(false, Ordering::Relaxed);

        if INTERRUPTS_ACTIVE.load(Ordering::Relaxed) {
            interrupt::enable();
        }
    }

    unsafe fn write(bytes: &[u8]) {
        (*addr_of_mut!(ENCODER)).write(bytes, do_write);
    }
}

fn do_write(bytes: &[u8]) {
    // frames logged before the UART is up are dropped
    LOG_UART.with(|uart| uart.write_full_blocking(bytes));
}
