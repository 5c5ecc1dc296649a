//! RLE Code Layouts

/// A decoded RLE command byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RleCommand {
    /// Write the following byte this many times.
    Repeat(usize),

    /// Copy this many literal bytes that follow.
    Copy(usize),
}

impl RleCommand {
    /// Returns the number of output bytes the command produces.
    pub fn len(&self) -> usize {
        match *self {
            Self::Repeat(n) | Self::Copy(n) => n,
        }
    }

    /// Returns true if the command produces no output.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bit layout of RLE command bytes. Encoding and decoding are generic over the layout so one algorithm serves
/// every variant without dynamic dispatch.
pub trait RleLayout {
    /// Longest run a single repeat command may encode.
    const MAX_REPEAT: usize = 0x7F;

    /// Longest run a single copy command may encode.
    const MAX_COPY: usize = 0x7F;

    /// Decode a command byte.
    ///
    /// * `code` - The command byte.
    fn read_code(code: u8) -> RleCommand;

    /// Encode a command. Lengths must be in `1..=MAX_REPEAT` or `1..=MAX_COPY`.
    ///
    /// * `command` - The command.
    fn write_code(command: RleCommand) -> u8;
}

/// Layout used by CPVS files: high bit set means copy `code & 0x7F` bytes, high bit clear means repeat the next
/// byte `(code & 0x7F) + 1` times. A copy code of `0x80` is the only zero-length command.
#[derive(Copy, Clone, Debug, Default)]
pub struct CpvsLayout;

impl RleLayout for CpvsLayout {
    fn read_code(code: u8) -> RleCommand {
        if code & 0x80 != 0 {
            RleCommand::Copy((code & 0x7F) as usize)
        } else {
            RleCommand::Repeat((code & 0x7F) as usize + 1)
        }
    }

    fn write_code(command: RleCommand) -> u8 {
        match command {
            RleCommand::Copy(n) => 0x80 | (n as u8 & 0x7F),
            RleCommand::Repeat(n) => (n - 1) as u8 & 0x7F,
        }
    }
}

/// High bit set means repeat; the run length is `code & 0x7F` for both commands.
#[derive(Copy, Clone, Debug, Default)]
pub struct HighBitRepeat;

impl RleLayout for HighBitRepeat {
    fn read_code(code: u8) -> RleCommand {
        let n = (code & 0x7F) as usize;
        if code & 0x80 != 0 {
            RleCommand::Repeat(n)
        } else {
            RleCommand::Copy(n)
        }
    }

    fn write_code(command: RleCommand) -> u8 {
        match command {
            RleCommand::Repeat(n) => 0x80 | (n as u8 & 0x7F),
            RleCommand::Copy(n) => n as u8 & 0x7F,
        }
    }
}

/// High bit set means copy; the run length is `code & 0x7F` for both commands.
#[derive(Copy, Clone, Debug, Default)]
pub struct HighBitCopy;

impl RleLayout for HighBitCopy {
    fn read_code(code: u8) -> RleCommand {
        let n = (code & 0x7F) as usize;
        if code & 0x80 != 0 {
            RleCommand::Copy(n)
        } else {
            RleCommand::Repeat(n)
        }
    }

    fn write_code(command: RleCommand) -> u8 {
        match command {
            RleCommand::Copy(n) => 0x80 | (n as u8 & 0x7F),
            RleCommand::Repeat(n) => n as u8 & 0x7F,
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpvs_repeat_length_is_offset_by_one() {
        assert_eq!(CpvsLayout::read_code(0x80), RleCommand::Copy(0));
        assert_eq!(CpvsLayout::read_code(0xFF), RleCommand::Copy(127));
        assert_eq!(CpvsLayout::read_code(0x03), RleCommand::Repeat(4));
        assert_eq!(CpvsLayout::read_code(0x00), RleCommand::Repeat(1));
        assert_eq!(CpvsLayout::read_code(0x7F), RleCommand::Repeat(128));
        assert_eq!(CpvsLayout::write_code(RleCommand::Copy(2)), 0x82);
        assert_eq!(CpvsLayout::write_code(RleCommand::Repeat(4)), 0x03);
        assert_eq!(CpvsLayout::write_code(RleCommand::Repeat(127)), 0x7E);
    }

    #[test]
    fn high_bit_layouts_use_plain_lengths() {
        assert_eq!(HighBitRepeat::read_code(0x83), RleCommand::Repeat(3));
        assert_eq!(HighBitRepeat::read_code(0x03), RleCommand::Copy(3));
        assert_eq!(HighBitCopy::read_code(0x83), RleCommand::Copy(3));
        assert_eq!(HighBitCopy::read_code(0x03), RleCommand::Repeat(3));
        assert_eq!(HighBitRepeat::write_code(RleCommand::Repeat(5)), 0x85);
        assert_eq!(HighBitCopy::write_code(RleCommand::Copy(5)), 0x85);
    }
}
