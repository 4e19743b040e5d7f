use crate::buffer::Type;
use crate::capability::Capabilities;
use crate::device::Device;
use crate::error::{Error, Result};
use crate::pool::Element;

/// Memory-to-memory buffer arbitration.
///
/// A transform collaborator pulls one queued element from each side,
/// runs the transform from the output (source) payload into the capture
/// (result) payload, and completes both. Nothing here blocks; when a pair
/// is not available the trigger simply retries on the next dequeue.
impl Device {
    /// Takes the head of both queued lists of a memory-to-memory device.
    ///
    /// Returns `(capture, output)` when both sides have a queued element.
    /// When either side is empty this is a clean no-op: nothing is
    /// consumed, `None` is returned, and the call may be repeated.
    pub fn m2m_take_queued_pair(&self) -> Result<Option<(Element, Element)>> {
        if !self.capabilities().contains(Capabilities::VIDEO_M2M) {
            return Err(Error::InvalidArgument);
        }

        let capture = match self.take_queued(Type::VideoCapture) {
            Some(element) => element,
            None => return Ok(None),
        };
        let output = match self.take_queued(Type::VideoOutput) {
            Some(element) => element,
            None => {
                // keep the capture element at the head so ordering holds
                capture.requeue();
                return Ok(None);
            }
        };

        Ok(Some((capture, output)))
    }

    /// Completes a transformed pair: the capture element carries
    /// `capture_len` bytes of result data, the consumed output element is
    /// completed empty so its dequeue hands the source buffer back to the
    /// application.
    pub fn m2m_complete_pair(&self, capture: Element, capture_len: u32, output: Element) {
        capture.complete(capture_len);
        output.complete(0);
    }

    /// Returns an untransformed pair to the head of their queued lists for
    /// a later retry
    pub fn m2m_requeue_pair(&self, capture: Element, output: Element) {
        capture.requeue();
        output.requeue();
    }
}
