//! TCP sequence number wrapping between 64-bit absolute indices and
//! 32-bit wire sequence numbers.
use std::fmt;
use std::ops::Add;

/// 2^32, the size of the wire sequence space.
const SEQ_SPACE: u64 = 1 << 32;

/// A 32-bit sequence number as carried in a TCP header.
///
/// Absolute sequence indices count every sequence number used since the
/// start of a connection (the SYN is index 0) and never wrap. On the wire the
/// same index is encoded relative to the connection's initial sequence
/// number (the "zero point") and wraps after 2^32 - 1.
///
/// # Examples
///
/// ```
/// use streamwire::tcp::Wrap32;
///
/// let isn = Wrap32::new(u32::MAX - 1);
/// let seqno = Wrap32::wrap(5, isn);
/// assert_eq!(seqno, Wrap32::new(3));
/// assert_eq!(seqno.unwrap(isn, 0), 5);
/// ```
///
/// # References
///
/// - RFC 793: Transmission Control Protocol
/// - RFC 1323: TCP Extensions for High Performance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Wrap32(u32);

impl Wrap32 {
    pub const fn new(raw: u32) -> Self {
        Wrap32(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Encode the absolute index `n` relative to `zero_point`.
    pub fn wrap(n: u64, zero_point: Wrap32) -> Self {
        Wrap32(zero_point.0.wrapping_add(n as u32))
    }

    /// Recover the absolute index for this sequence number that lies
    /// closest to `checkpoint`.
    ///
    /// Many absolute indices map to the same wire value. The checkpoint is a
    /// recently seen absolute index and picks the candidate nearest to it. When
    /// both neighbours are exactly 2^31 away the forward one wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use streamwire::tcp::Wrap32;
    ///
    /// let zero = Wrap32::new(0);
    /// // Just past a wrap: checkpoint 2^32 + 10 pulls 5 into the second lap
    /// assert_eq!(Wrap32::new(5).unwrap(zero, (1 << 32) + 10), (1 << 32) + 5);
    /// // Near the start the backward candidate would be negative
    /// assert_eq!(Wrap32::new(u32::MAX).unwrap(zero, 0), u32::MAX as u64);
    /// ```
    pub fn unwrap(self, zero_point: Wrap32, checkpoint: u64) -> u64 {
        let checkpoint_raw = Wrap32::wrap(checkpoint, zero_point).0;
        let offset = self.0.wrapping_sub(checkpoint_raw) as u64;

        match checkpoint.checked_add(offset) {
            Some(forward) if offset <= SEQ_SPACE / 2 || forward < SEQ_SPACE => forward,
            Some(forward) => forward - SEQ_SPACE,
            // forward candidate is not representable
            None => checkpoint - (SEQ_SPACE - offset),
        }
    }
}

impl Add<u32> for Wrap32 {
    type Output = Wrap32;

    fn add(self, rhs: u32) -> Wrap32 {
        Wrap32(self.0.wrapping_add(rhs))
    }
}

impl fmt::Display for Wrap32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
