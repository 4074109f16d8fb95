use crate::error::SlaveError;

/// One slave-mode transfer: `size` bytes clocked by the remote master.
///
/// `tx` is shifted out to the master, `rx` is filled with what the master
/// sends. Either may be absent. Ownership of the descriptor moves to the
/// worker when its batch is triggered and comes back through
/// [`Slave::take_batch`](crate::Slave::take_batch) once the batch completes.
#[derive(Debug, Default)]
pub struct Transfer<'b> {
    size: usize,
    tx: Option<&'b [u8]>,
    rx: Option<&'b mut [u8]>,
    context: usize,
    transferred_bits: usize,
}

impl<'b> Transfer<'b> {
    pub const fn new(size: usize) -> Self {
        Self { size, tx: None, rx: None, context: 0, transferred_bits: 0 }
    }

    /// Full-duplex transfer of `size` bytes.
    pub fn duplex(tx: &'b [u8], rx: &'b mut [u8], size: usize) -> Self {
        Self::new(size).with_tx(tx).with_rx(rx)
    }

    pub fn with_tx(mut self, tx: &'b [u8]) -> Self {
        self.tx = Some(tx);
        self
    }

    pub fn with_rx(mut self, rx: &'b mut [u8]) -> Self {
        self.rx = Some(rx);
        self
    }

    /// Opaque value handed back untouched to the [`TransferHooks`](crate::TransferHooks).
    pub fn with_context(mut self, context: usize) -> Self {
        self.context = context;
        self
    }

    /// Requested length in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Requested length in bits, as armed in the peripheral.
    pub fn length_bits(&self) -> usize {
        self.size * 8
    }

    pub fn tx(&self) -> Option<&'b [u8]> {
        self.tx
    }

    pub fn rx(&self) -> Option<&[u8]> {
        self.rx.as_deref()
    }

    pub fn rx_mut(&mut self) -> Option<&mut [u8]> {
        self.rx.as_deref_mut()
    }

    pub fn context(&self) -> usize {
        self.context
    }

    /// Bits actually clocked by the master; zero until the transfer completes.
    pub fn transferred_bits(&self) -> usize {
        self.transferred_bits
    }

    /// Whole bytes actually clocked by the master.
    pub fn received_bytes(&self) -> usize {
        self.transferred_bits / 8
    }

    /// Give the buffers back, so they can be read or reused in a new transfer.
    pub fn into_parts(self) -> (Option<&'b [u8]>, Option<&'b mut [u8]>) {
        (self.tx, self.rx)
    }

    pub fn into_rx(self) -> Option<&'b mut [u8]> {
        self.rx
    }

    /// The master can end a transfer early but never clock past the armed length.
    pub(crate) fn set_transferred_bits(&mut self, bits: usize) {
        self.transferred_bits = bits.min(self.length_bits());
    }

    pub(crate) fn validate(
        &self,
        max_transfer_size: usize,
    ) -> Result<(), SlaveError> {
        if self.size == 0 || self.size > max_transfer_size {
            return Err(SlaveError::InvalidTransfer);
        }
        let tx_short = self.tx.is_some_and(|tx| tx.len() < self.size);
        let rx_short = self.rx.as_ref().is_some_and(|rx| rx.len() < self.size);
        if tx_short || rx_short {
            return Err(SlaveError::InvalidTransfer);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_counted_in_bits() {
        let t = Transfer::new(4);
        assert_eq!(t.size(), 4);
        assert_eq!(t.length_bits(), 32);
        assert_eq!(t.transferred_bits(), 0);
    }

    #[test]
    fn partial_bytes_round_down() {
        let mut t = Transfer::new(4);
        t.set_transferred_bits(13);
        assert_eq!(t.transferred_bits(), 13);
        assert_eq!(t.received_bytes(), 1);
    }

    #[test]
    fn transferred_bits_clamp_to_armed_length() {
        let mut t = Transfer::new(2);
        t.set_transferred_bits(64);
        assert_eq!(t.received_bytes(), 2);
    }

    #[test]
    fn validate_rejects_short_buffers() {
        let tx = [0u8; 2];
        let mut rx = [0u8; 8];
        assert_eq!(
            Transfer::duplex(&tx, &mut rx, 4).validate(64),
            Err(SlaveError::InvalidTransfer)
        );

        let mut rx = [0u8; 2];
        assert_eq!(
            Transfer::new(4).with_rx(&mut rx).validate(64),
            Err(SlaveError::InvalidTransfer)
        );
    }

    #[test]
    fn validate_checks_size_bounds() {
        assert_eq!(
            Transfer::new(0).validate(64),
            Err(SlaveError::InvalidTransfer)
        );
        assert_eq!(
            Transfer::new(65).validate(64),
            Err(SlaveError::InvalidTransfer)
        );
        assert_eq!(Transfer::new(64).validate(64), Ok(()));
    }

    #[test]
    fn buffers_can_be_taken_back() {
        let tx = [1u8; 2];
        let mut rx = [0u8; 2];
        let mut t = Transfer::duplex(&tx, &mut rx, 2);
        t.rx_mut().unwrap().copy_from_slice(&[5, 6]);

        let (tx_back, rx_back) = t.into_parts();
        assert_eq!(tx_back, Some(&[1u8, 1][..]));
        let rx_back = rx_back.unwrap();
        assert_eq!(rx_back, &[5, 6]);

        let t = Transfer::new(2).with_rx(rx_back);
        assert_eq!(t.into_rx().map(|rx| rx.len()), Some(2));
    }

    #[test]
    fn context_is_kept() {
        let t = Transfer::new(1).with_context(0xdead);
        assert_eq!(t.context(), 0xdead);
    }
}
