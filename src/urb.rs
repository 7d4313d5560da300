//! USB Request Block: one in-flight transfer against an endpoint.
//!
//! Mirrors the environment's `TUSBRequest` — an endpoint, a buffer, an
//! optional SETUP packet for control transfers, and an optional completion
//! callback with two opaque context pointers so a caller can submit many
//! URBs without heap-allocating a closure per submission (§4.4).

use alloc::vec::Vec;

use crate::desc::SetupPacket;
use crate::endpoint::Endpoint;
use crate::err::UsbError;

/// Invoked from [`crate::hcd::Hcd::on_timer_tick`]/interrupt context once a
/// URB completes; mirrors `TURBCompletionRoutine(pURB, pParam, pContext)`.
pub type CompletionRoutine = fn(urb: &mut Urb, param: *mut u8, context: *mut u8);

/// Outcome of a completed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrbStatus {
    /// Still queued or in flight.
    Pending,
    /// Completed; all requested bytes transferred (or fewer on a short IN
    /// packet, which is not itself an error).
    Ok,
    /// Completed with an error; see the carried [`UsbError`].
    Error(UsbError),
}

/// One USB transfer request.
///
/// Built with [`Urb::new`] (bulk/interrupt) or [`Urb::new_control`] (control,
/// carries a [`SetupPacket`]). `buffer` is host-owned; the HCD copies into or
/// out of it as channels complete, so it must stay alive until the URB
/// completes.
pub struct Urb {
    endpoint: Endpoint,
    setup: Option<SetupPacket>,
    buffer: Vec<u8>,
    bytes_transferred: usize,
    status: UrbStatus,
    completion: Option<CompletionRoutine>,
    param: *mut u8,
    context: *mut u8,
}

// SAFETY: `param`/`context` are opaque handles the caller controls; the HCD
// never dereferences them, only threads them through to the completion
// routine on the same core that submitted the URB.
unsafe impl Send for Urb {}

impl Urb {
    /// Creates a bulk or interrupt transfer. `buffer.len()` is both the
    /// maximum IN transfer size and the exact OUT length.
    pub fn new(endpoint: Endpoint, buffer: Vec<u8>) -> Self {
        Self {
            endpoint,
            setup: None,
            buffer,
            bytes_transferred: 0,
            status: UrbStatus::Pending,
            completion: None,
            param: core::ptr::null_mut(),
            context: core::ptr::null_mut(),
        }
    }

    /// Creates a control transfer: SETUP stage from `setup`, optional
    /// DATA stage through `buffer` (empty for no-data requests), STATUS stage
    /// handled by the HCD.
    pub fn new_control(endpoint: Endpoint, setup: SetupPacket, buffer: Vec<u8>) -> Self {
        Self {
            endpoint,
            setup: Some(setup),
            buffer,
            bytes_transferred: 0,
            status: UrbStatus::Pending,
            completion: None,
            param: core::ptr::null_mut(),
            context: core::ptr::null_mut(),
        }
    }

    /// Registers a completion callback, invoked with two caller-owned context
    /// pointers once the HCD marks this URB complete.
    pub fn set_completion_routine(
        &mut self,
        routine: CompletionRoutine,
        param: *mut u8,
        context: *mut u8,
    ) {
        self.completion = Some(routine);
        self.param = param;
        self.context = context;
    }

    /// The endpoint this URB targets.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Mutable access to the endpoint, for PID toggling as stages complete.
    pub fn endpoint_mut(&mut self) -> &mut Endpoint {
        &mut self.endpoint
    }

    /// The SETUP packet, for control transfers.
    pub fn setup(&self) -> Option<&SetupPacket> {
        self.setup.as_ref()
    }

    /// The data buffer, read for OUT transfers, written for IN.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Mutable access to the data buffer, for the HCD to copy received bytes in.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Mutable access to both the endpoint and the data buffer at once, for
    /// callers that need to pass both to the same transfer call.
    pub fn endpoint_and_buffer_mut(&mut self) -> (&mut Endpoint, &mut [u8]) {
        (&mut self.endpoint, &mut self.buffer)
    }

    /// Bytes actually transferred once complete (may be less than
    /// `buffer().len()` on a short IN packet).
    pub fn bytes_transferred(&self) -> usize {
        self.bytes_transferred
    }

    /// Current status.
    pub fn status(&self) -> UrbStatus {
        self.status
    }

    /// Marks this URB complete, recording `bytes` transferred, and invokes
    /// the completion routine if one was registered.
    pub fn complete(&mut self, bytes: usize) {
        self.bytes_transferred = bytes;
        self.status = UrbStatus::Ok;
        self.fire_completion();
    }

    /// Marks this URB failed with `err` and invokes the completion routine.
    pub fn fail(&mut self, err: UsbError) {
        self.status = UrbStatus::Error(err);
        self.fire_completion();
    }

    fn fire_completion(&mut self) {
        if let Some(routine) = self.completion {
            let param = self.param;
            let context = self.context;
            routine(self, param, context);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn dummy_completion(urb: &mut Urb, param: *mut u8, _context: *mut u8) {
        // Record the transferred byte count through the param pointer.
        unsafe {
            *(param as *mut usize) = urb.bytes_transferred();
        }
    }

    #[test]
    fn complete_invokes_completion_routine() {
        let ep = Endpoint::new_control(1, 8);
        let mut urb = Urb::new(ep, vec![0u8; 4]);
        let mut recorded: usize = 0;
        urb.set_completion_routine(
            dummy_completion,
            &mut recorded as *mut usize as *mut u8,
            core::ptr::null_mut(),
        );
        urb.complete(4);
        assert_eq!(recorded, 4);
        assert_eq!(urb.status(), UrbStatus::Ok);
    }

    #[test]
    fn fail_sets_error_status() {
        let ep = Endpoint::new_control(1, 8);
        let mut urb = Urb::new(ep, vec![0u8; 4]);
        urb.fail(UsbError::Stall);
        assert_eq!(urb.status(), UrbStatus::Error(UsbError::Stall));
    }
}
