//! Hardware register dispatch.

/// Chip registers behind HARDWARE-tagged addresses (GTIA, POKEY, PIA,
/// ANTIC and friends). The cartridge area at $D500-$D5FF and the Bounty
/// Bob hotspots are handled before this is consulted.
pub trait Hardware {
    fn read(&mut self, addr: u16) -> u8;

    fn write(&mut self, addr: u16, value: u8);

    /// A WSYNC request raised by the last write, as the cycle at which the
    /// CPU may continue.
    fn take_wsync(&mut self) -> Option<u32> {
        None
    }
}

/// Open bus. Reads return $FF and writes go nowhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHardware;

impl Hardware for NullHardware {
    fn read(&mut self, _addr: u16) -> u8 {
        0xFF
    }

    fn write(&mut self, _addr: u16, _value: u8) {}
}
