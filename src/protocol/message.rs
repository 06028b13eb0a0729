use crate::core::HEADER_LEN;

/// Protocol commands with their stable wire ordinals.
///
/// The ordinal travels in the low 24 bits of the frame's three-byte command
/// field; the mapping is versioned and shared by every node on the network.
/// Codes the local build does not recognize decode to [`Command::Unknown`]
/// and are ignored at dispatch, never rejected by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Discovery probe
    WhoIsHere,
    /// Discovery answer
    IAmHere,
    /// Assign the master role to the addressed node
    SetAsMaster,
    /// Assign the slave role to the addressed node
    SetAsSlave,
    /// Overwrite the addressed node's clock with (seconds, microseconds)
    SetTimeOverwrite,
    /// Ask nodes to report their current time
    GetTimeFromAll,
    /// Answer to [`Command::GetTimeFromAll`]
    ReplyTimeFromAll,
    /// Acknowledgment; single argument is the acknowledged command code
    Ack,
    /// Master's sync broadcast carrying its send time
    Sync,
    /// Slave's delay measurement request
    DelayRequest,
    /// Master's answer to a delay request, carrying its send time
    DelayResponse,
    /// Start or stop the periodic measurement timer; argument is the
    /// period in milliseconds, zero stops it
    ConfigureMeasurement,
    /// Measurement data report; carried but not interpreted by the core
    MeasurementReport,
    /// Soft restart of the addressed node
    Reset,
    /// Any other 24-bit code, carried through for diagnostics
    Unknown(u32),
}

impl Command {
    /// Returns the 24-bit wire code for this command
    pub fn code(self) -> u32 {
        match self {
            Command::WhoIsHere => 0,
            Command::IAmHere => 1,
            Command::SetAsMaster => 2,
            Command::SetAsSlave => 3,
            Command::SetTimeOverwrite => 4,
            Command::GetTimeFromAll => 5,
            Command::ReplyTimeFromAll => 6,
            Command::Ack => 7,
            Command::Sync => 8,
            Command::DelayRequest => 9,
            Command::DelayResponse => 10,
            Command::ConfigureMeasurement => 11,
            Command::MeasurementReport => 12,
            Command::Reset => 13,
            Command::Unknown(code) => code & 0x00FF_FFFF,
        }
    }

    /// Maps a 24-bit wire code back to a command
    pub fn from_code(code: u32) -> Self {
        match code & 0x00FF_FFFF {
            0 => Command::WhoIsHere,
            1 => Command::IAmHere,
            2 => Command::SetAsMaster,
            3 => Command::SetAsSlave,
            4 => Command::SetTimeOverwrite,
            5 => Command::GetTimeFromAll,
            6 => Command::ReplyTimeFromAll,
            7 => Command::Ack,
            8 => Command::Sync,
            9 => Command::DelayRequest,
            10 => Command::DelayResponse,
            11 => Command::ConfigureMeasurement,
            12 => Command::MeasurementReport,
            13 => Command::Reset,
            other => Command::Unknown(other),
        }
    }
}

/// One addressed command/argument message, the wire-level unit of the protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Destination node address, or [`crate::core::BROADCAST_ADDRESS`]
    pub destination: u32,
    /// Sending node's address
    pub source: u32,
    /// The command to execute
    pub command: Command,
    /// Positional arguments; meaning is command-specific
    pub arguments: Vec<u32>,
}

impl Message {
    /// Creates a message with no arguments
    pub fn new(destination: u32, source: u32, command: Command) -> Self {
        Message {
            destination,
            source,
            command,
            arguments: Vec::new(),
        }
    }

    /// Creates a message with the given argument list
    pub fn with_arguments(
        destination: u32,
        source: u32,
        command: Command,
        arguments: Vec<u32>,
    ) -> Self {
        Message {
            destination,
            source,
            command,
            arguments,
        }
    }

    /// Encoded frame length in bytes
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + 4 * self.arguments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for code in 0..14 {
            let command = Command::from_code(code);
            assert!(!matches!(command, Command::Unknown(_)));
            assert_eq!(command.code(), code);
        }
    }

    #[test]
    fn test_unknown_codes_pass_through() {
        let command = Command::from_code(0x00BEEF);
        assert_eq!(command, Command::Unknown(0x00BEEF));
        assert_eq!(command.code(), 0x00BEEF);
    }

    #[test]
    fn test_unknown_masked_to_24_bits() {
        // The high byte does not exist on the wire
        assert_eq!(Command::from_code(0xFF00_0008), Command::Sync);
        assert_eq!(Command::Unknown(0xFF12_3456).code(), 0x0012_3456);
    }

    #[test]
    fn test_encoded_len() {
        let msg = Message::new(1, 2, Command::WhoIsHere);
        assert_eq!(msg.encoded_len(), 12);

        let msg = Message::with_arguments(1, 2, Command::SetTimeOverwrite, vec![10, 20]);
        assert_eq!(msg.encoded_len(), 20);
    }
}
