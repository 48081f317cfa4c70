use std::fmt;

use num_enum::{FromPrimitive, IntoPrimitive};

/// SMPP v3.4 command_status codes.
///
/// Zero is success; everything else is a peer-reported failure. Codes outside
/// the catalog (including the vendor-reserved ranges) decode as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum Status {
    Ok = 0x0000_0000,
    InvalidMsgLength = 0x0000_0001,
    InvalidCommandLength = 0x0000_0002,
    InvalidCommandId = 0x0000_0003,
    InvalidBindStatus = 0x0000_0004,
    AlreadyBound = 0x0000_0005,
    InvalidPriorityFlag = 0x0000_0006,
    InvalidRegisteredDelivery = 0x0000_0007,
    SystemError = 0x0000_0008,
    InvalidSourceAddress = 0x0000_000A,
    InvalidDestAddress = 0x0000_000B,
    InvalidMessageId = 0x0000_000C,
    BindFailed = 0x0000_000D,
    InvalidPassword = 0x0000_000E,
    InvalidSystemId = 0x0000_000F,
    CancelFailed = 0x0000_0011,
    ReplaceFailed = 0x0000_0013,
    MessageQueueFull = 0x0000_0014,
    InvalidServiceType = 0x0000_0015,
    InvalidNumDests = 0x0000_0033,
    InvalidDistListName = 0x0000_0034,
    InvalidDestFlag = 0x0000_0040,
    InvalidSubmitWithReplace = 0x0000_0042,
    InvalidEsmClass = 0x0000_0043,
    CannotSubmitToDistList = 0x0000_0044,
    SubmitFailed = 0x0000_0045,
    InvalidSourceTon = 0x0000_0048,
    InvalidSourceNpi = 0x0000_0049,
    InvalidDestTon = 0x0000_0050,
    InvalidDestNpi = 0x0000_0051,
    InvalidSystemType = 0x0000_0053,
    InvalidReplaceFlag = 0x0000_0054,
    InvalidNumMessages = 0x0000_0055,
    Throttled = 0x0000_0058,
    InvalidScheduleTime = 0x0000_0061,
    InvalidExpiryTime = 0x0000_0062,
    InvalidDefaultMsgId = 0x0000_0063,
    ReceiverTempError = 0x0000_0064,
    ReceiverPermError = 0x0000_0065,
    ReceiverRejected = 0x0000_0066,
    QueryFailed = 0x0000_0067,
    InvalidTlvStream = 0x0000_00C0,
    TlvNotAllowed = 0x0000_00C1,
    InvalidTlvLength = 0x0000_00C2,
    MissingTlv = 0x0000_00C3,
    InvalidTlvValue = 0x0000_00C4,
    DeliveryFailure = 0x0000_00FE,
    UnknownError = 0x0000_00FF,
    #[num_enum(catch_all)]
    Other(u32),
}

impl Status {
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

// derive(Default)'s `#[default]` marker collides with num_enum's `catch_all`.
impl Default for Status {
    fn default() -> Self {
        Status::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Ok => "ESME_ROK",
            Status::InvalidMsgLength => "ESME_RINVMSGLEN",
            Status::InvalidCommandLength => "ESME_RINVCMDLEN",
            Status::InvalidCommandId => "ESME_RINVCMDID",
            Status::InvalidBindStatus => "ESME_RINVBNDSTS",
            Status::AlreadyBound => "ESME_RALYBND",
            Status::InvalidPriorityFlag => "ESME_RINVPRTFLG",
            Status::InvalidRegisteredDelivery => "ESME_RINVREGDLVFLG",
            Status::SystemError => "ESME_RSYSERR",
            Status::InvalidSourceAddress => "ESME_RINVSRCADR",
            Status::InvalidDestAddress => "ESME_RINVDSTADR",
            Status::InvalidMessageId => "ESME_RINVMSGID",
            Status::BindFailed => "ESME_RBINDFAIL",
            Status::InvalidPassword => "ESME_RINVPASWD",
            Status::InvalidSystemId => "ESME_RINVSYSID",
            Status::CancelFailed => "ESME_RCANCELFAIL",
            Status::ReplaceFailed => "ESME_RREPLACEFAIL",
            Status::MessageQueueFull => "ESME_RMSGQFUL",
            Status::InvalidServiceType => "ESME_RINVSERTYP",
            Status::InvalidNumDests => "ESME_RINVNUMDESTS",
            Status::InvalidDistListName => "ESME_RINVDLNAME",
            Status::InvalidDestFlag => "ESME_RINVDESTFLAG",
            Status::InvalidSubmitWithReplace => "ESME_RINVSUBREP",
            Status::InvalidEsmClass => "ESME_RINVESMCLASS",
            Status::CannotSubmitToDistList => "ESME_RCNTSUBDL",
            Status::SubmitFailed => "ESME_RSUBMITFAIL",
            Status::InvalidSourceTon => "ESME_RINVSRCTON",
            Status::InvalidSourceNpi => "ESME_RINVSRCNPI",
            Status::InvalidDestTon => "ESME_RINVDSTTON",
            Status::InvalidDestNpi => "ESME_RINVDSTNPI",
            Status::InvalidSystemType => "ESME_RINVSYSTYP",
            Status::InvalidReplaceFlag => "ESME_RINVREPFLAG",
            Status::InvalidNumMessages => "ESME_RINVNUMMSGS",
            Status::Throttled => "ESME_RTHROTTLED",
            Status::InvalidScheduleTime => "ESME_RINVSCHED",
            Status::InvalidExpiryTime => "ESME_RINVEXPIRY",
            Status::InvalidDefaultMsgId => "ESME_RINVDFTMSGID",
            Status::ReceiverTempError => "ESME_RX_T_APPN",
            Status::ReceiverPermError => "ESME_RX_P_APPN",
            Status::ReceiverRejected => "ESME_RX_R_APPN",
            Status::QueryFailed => "ESME_RQUERYFAIL",
            Status::InvalidTlvStream => "ESME_RINVOPTPARSTREAM",
            Status::TlvNotAllowed => "ESME_ROPTPARNOTALLWD",
            Status::InvalidTlvLength => "ESME_RINVPARLEN",
            Status::MissingTlv => "ESME_RMISSINGOPTPARAM",
            Status::InvalidTlvValue => "ESME_RINVOPTPARAMVAL",
            Status::DeliveryFailure => "ESME_RDELIVERYFAILURE",
            Status::UnknownError => "ESME_RUNKNOWNERR",
            Status::Other(code) => return write!(f, "reserved({code:#010x})"),
        };
        f.write_str(name)
    }
}
