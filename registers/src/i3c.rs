// Licensed under the Apache-2.0 license

//! I3C core register block. Byte offsets are relative to the start of
//! the CSR window; the base (HCI), secure firmware recovery and target
//! transaction interface (TTI) capability blocks live in one window.

// Base block (host controller interface).
pub const HCI_VERSION_OFFSET: u32 = 0x0;
pub const RESET_CONTROL_OFFSET: u32 = 0x10;
pub const COMMAND_PORT_OFFSET: u32 = 0x80;
pub const RESPONSE_PORT_OFFSET: u32 = 0x84;
// TX and RX data ports decode to the same address; direction selects.
pub const XFER_DATA_PORT_OFFSET: u32 = 0x88;
pub const IBI_PORT_OFFSET: u32 = 0x8c;
pub const QUEUE_THLD_CTRL_OFFSET: u32 = 0x90;
pub const DATA_BUFFER_THLD_CTRL_OFFSET: u32 = 0x94;
pub const QUEUE_SIZE_OFFSET: u32 = 0x98;
pub const ALT_QUEUE_SIZE_OFFSET: u32 = 0x9c;
pub const PIO_INTR_STATUS_OFFSET: u32 = 0xa0;

// Secure firmware recovery interface block.
pub const SEC_FW_RECOVERY_IF_START: u32 = 0x100;
pub const SEC_EXTCAP_HEADER_OFFSET: u32 = 0x100;
pub const PROT_CAP_0_OFFSET: u32 = 0x104;
pub const PROT_CAP_1_OFFSET: u32 = 0x108;
pub const PROT_CAP_2_OFFSET: u32 = 0x10c;
pub const PROT_CAP_3_OFFSET: u32 = 0x110;
pub const DEVICE_ID_0_OFFSET: u32 = 0x114;
pub const DEVICE_ID_1_OFFSET: u32 = 0x118;
pub const DEVICE_ID_2_OFFSET: u32 = 0x11c;
pub const DEVICE_ID_3_OFFSET: u32 = 0x120;
pub const DEVICE_ID_4_OFFSET: u32 = 0x124;
pub const DEVICE_ID_5_OFFSET: u32 = 0x128;
pub const DEVICE_ID_6_OFFSET: u32 = 0x12c;
pub const DEVICE_STATUS_0_OFFSET: u32 = 0x130;
pub const DEVICE_STATUS_1_OFFSET: u32 = 0x134;
pub const DEVICE_RESET_OFFSET: u32 = 0x138;
pub const RECOVERY_CTRL_OFFSET: u32 = 0x13c;
pub const RECOVERY_STATUS_OFFSET: u32 = 0x140;
pub const HW_STATUS_OFFSET: u32 = 0x144;
pub const INDIRECT_FIFO_CTRL_0_OFFSET: u32 = 0x148;
pub const INDIRECT_FIFO_CTRL_1_OFFSET: u32 = 0x14c;
pub const INDIRECT_FIFO_STATUS_0_OFFSET: u32 = 0x150;
pub const INDIRECT_FIFO_STATUS_1_OFFSET: u32 = 0x154;
pub const INDIRECT_FIFO_STATUS_2_OFFSET: u32 = 0x158;
pub const INDIRECT_FIFO_STATUS_3_OFFSET: u32 = 0x15c;
pub const INDIRECT_FIFO_STATUS_4_OFFSET: u32 = 0x160;
pub const INDIRECT_FIFO_RESERVED_OFFSET: u32 = 0x164;
pub const INDIRECT_FIFO_DATA_OFFSET: u32 = 0x168;

// Target transaction interface block.
pub const TTI_START: u32 = 0x1c0;
pub const TTI_EXTCAP_HEADER_OFFSET: u32 = 0x1c0;
pub const TTI_CONTROL_OFFSET: u32 = 0x1c4;
pub const TTI_STATUS_OFFSET: u32 = 0x1c8;
pub const TTI_RESET_CONTROL_OFFSET: u32 = 0x1cc;
pub const TTI_INTERRUPT_STATUS_OFFSET: u32 = 0x1d0;
pub const TTI_INTERRUPT_ENABLE_OFFSET: u32 = 0x1d4;
pub const TTI_INTERRUPT_FORCE_OFFSET: u32 = 0x1d8;
pub const TTI_RX_DESC_QUEUE_PORT_OFFSET: u32 = 0x1dc;
pub const TTI_RX_DATA_PORT_OFFSET: u32 = 0x1e0;
pub const TTI_TX_DESC_QUEUE_PORT_OFFSET: u32 = 0x1e4;
pub const TTI_TX_DATA_PORT_OFFSET: u32 = 0x1e8;
pub const TTI_IBI_PORT_OFFSET: u32 = 0x1ec;
pub const TTI_QUEUE_SIZE_OFFSET: u32 = 0x1f0;
pub const TTI_IBI_QUEUE_SIZE_OFFSET: u32 = 0x1f4;
pub const TTI_QUEUE_THLD_CTRL_OFFSET: u32 = 0x1f8;
pub const TTI_DATA_BUFFER_THLD_CTRL_OFFSET: u32 = 0x1fc;

pub mod bits {
    //! Types that represent individual registers (bitfields).
    use tock_registers::register_bitfields;

    register_bitfields! {
        u32,
        pub ResetControl [
            SoftRst OFFSET(0) NUMBITS(1) [],
            CmdQueueRst OFFSET(1) NUMBITS(1) [],
            RespQueueRst OFFSET(2) NUMBITS(1) [],
            TxFifoRst OFFSET(3) NUMBITS(1) [],
            RxFifoRst OFFSET(4) NUMBITS(1) [],
            IbiQueueRst OFFSET(5) NUMBITS(1) [],
        ],
        pub QueueThldCtrl [
            CmdEmptyBufThld OFFSET(0) NUMBITS(8) [],
            RespBufThld OFFSET(8) NUMBITS(8) [],
            IbiDataSegmentSize OFFSET(16) NUMBITS(8) [],
            IbiStatusThld OFFSET(24) NUMBITS(8) [],
        ],
        pub DataBufferThldCtrl [
            TxBufThld OFFSET(0) NUMBITS(3) [],
            RxBufThld OFFSET(8) NUMBITS(3) [],
            TxStartThld OFFSET(16) NUMBITS(3) [],
            RxStartThld OFFSET(24) NUMBITS(3) [],
        ],
        pub QueueSize [
            CrQueueSize OFFSET(0) NUMBITS(8) [],
            IbiStatusSize OFFSET(8) NUMBITS(8) [],
            RxDataBufferSize OFFSET(16) NUMBITS(8) [],
            TxDataBufferSize OFFSET(24) NUMBITS(8) [],
        ],
        pub AltQueueSize [
            AltRespQueueSize OFFSET(0) NUMBITS(8) [],
            AltRespQueueEn OFFSET(24) NUMBITS(1) [],
            ExtIbiQueueEn OFFSET(28) NUMBITS(1) [],
        ],
        pub PioIntrStatus [
            TxThldStat OFFSET(0) NUMBITS(1) [],
            RxThldStat OFFSET(1) NUMBITS(1) [],
            IbiStatusThldStat OFFSET(2) NUMBITS(1) [],
            CmdQueueReadyStat OFFSET(3) NUMBITS(1) [],
            RespReadyStat OFFSET(4) NUMBITS(1) [],
            TransferAbortStat OFFSET(5) NUMBITS(1) [],
            TransferErrStat OFFSET(9) NUMBITS(1) [],
        ],
    }

    register_bitfields! {
        u32,
        pub ExtcapHeader [
            CapId OFFSET(0) NUMBITS(8) [],
            CapLength OFFSET(8) NUMBITS(16) [],
        ],
        pub ProtCap2 [
            RecProtVersion OFFSET(0) NUMBITS(16) [],
            AgentCaps OFFSET(16) NUMBITS(16) [],
        ],
        pub ProtCap3 [
            NumOfCmsRegions OFFSET(0) NUMBITS(8) [],
            MaxRespTime OFFSET(8) NUMBITS(8) [],
            HeartbeatPeriod OFFSET(16) NUMBITS(8) [],
        ],
        pub DeviceId0 [
            DescType OFFSET(0) NUMBITS(8) [],
            VendorSpecificStrLength OFFSET(8) NUMBITS(8) [],
        ],
        pub DeviceStatus0 [
            DevStatus OFFSET(0) NUMBITS(8) [],
            ProtError OFFSET(8) NUMBITS(8) [],
            RecReasonCode OFFSET(16) NUMBITS(16) [],
        ],
        pub DeviceStatus1 [
            Heartbeat OFFSET(0) NUMBITS(16) [],
            VendorStatusLength OFFSET(16) NUMBITS(9) [],
            VendorStatus OFFSET(25) NUMBITS(7) [],
        ],
        pub DeviceReset [
            ResetCtrl OFFSET(0) NUMBITS(8) [],
            ForcedRecovery OFFSET(8) NUMBITS(8) [],
            IfCtrl OFFSET(16) NUMBITS(8) [],
        ],
        pub RecoveryCtrl [
            Cms OFFSET(0) NUMBITS(8) [],
            RecImgSel OFFSET(8) NUMBITS(8) [],
            ActivateRecImg OFFSET(16) NUMBITS(8) [],
        ],
        pub RecoveryStatus [
            DevRecStatus OFFSET(0) NUMBITS(4) [],
            RecImgIndex OFFSET(4) NUMBITS(4) [],
            VendorSpecificStatus OFFSET(8) NUMBITS(8) [],
        ],
        pub HwStatus [
            TempCritical OFFSET(0) NUMBITS(1) [],
            SoftErr OFFSET(1) NUMBITS(1) [],
            FatalErr OFFSET(2) NUMBITS(1) [],
            VendorHwStatus OFFSET(8) NUMBITS(8) [],
            Ctemp OFFSET(16) NUMBITS(8) [],
            VendorHwStatusLen OFFSET(24) NUMBITS(8) [],
        ],
        pub IndirectFifoCtrl0 [
            Cms OFFSET(0) NUMBITS(8) [],
            Reset OFFSET(8) NUMBITS(8) [],
            ImageSizeMsb OFFSET(16) NUMBITS(16) [],
        ],
        pub IndirectFifoCtrl1 [
            ImageSizeLsb OFFSET(0) NUMBITS(16) [],
        ],
        pub IndirectFifoStatus0 [
            Empty OFFSET(0) NUMBITS(1) [],
            Full OFFSET(1) NUMBITS(1) [],
            RegionType OFFSET(8) NUMBITS(3) [],
        ],
    }

    register_bitfields! {
        u32,
        pub TtiControl [
            HjEn OFFSET(10) NUMBITS(1) [],
            CrrEn OFFSET(11) NUMBITS(1) [],
            IbiEn OFFSET(12) NUMBITS(1) [],
            IbiRetryNum OFFSET(13) NUMBITS(3) [],
        ],
        pub TtiStatus [
            ProtocolError OFFSET(13) NUMBITS(1) [],
            LastIbiStatus OFFSET(14) NUMBITS(2) [],
        ],
        pub TtiResetControl [
            SoftRst OFFSET(0) NUMBITS(1) [],
            TxDescRst OFFSET(1) NUMBITS(1) [],
            RxDescRst OFFSET(2) NUMBITS(1) [],
            TxDataRst OFFSET(3) NUMBITS(1) [],
            RxDataRst OFFSET(4) NUMBITS(1) [],
            IbiQueueRst OFFSET(5) NUMBITS(1) [],
        ],
        pub InterruptStatus [
            RxDescStat OFFSET(0) NUMBITS(1) [],
            TxDescStat OFFSET(1) NUMBITS(1) [],
            RxDescTimeout OFFSET(2) NUMBITS(1) [],
            TxDescTimeout OFFSET(3) NUMBITS(1) [],
            TxDataThldStat OFFSET(8) NUMBITS(1) [],
            RxDataThldStat OFFSET(9) NUMBITS(1) [],
            TxDescThldStat OFFSET(10) NUMBITS(1) [],
            RxDescThldStat OFFSET(11) NUMBITS(1) [],
            IbiThldStat OFFSET(12) NUMBITS(1) [],
            IbiDone OFFSET(13) NUMBITS(1) [],
            PendingInterrupt OFFSET(15) NUMBITS(4) [],
            TransferAbortStat OFFSET(25) NUMBITS(1) [],
            TransferErrStat OFFSET(31) NUMBITS(1) [],
        ],
        pub InterruptEnable [
            RxDescStatEn OFFSET(0) NUMBITS(1) [],
            TxDescStatEn OFFSET(1) NUMBITS(1) [],
            RxDescTimeoutEn OFFSET(2) NUMBITS(1) [],
            TxDescTimeoutEn OFFSET(3) NUMBITS(1) [],
            TxDataThldStatEn OFFSET(8) NUMBITS(1) [],
            RxDataThldStatEn OFFSET(9) NUMBITS(1) [],
            TxDescThldStatEn OFFSET(10) NUMBITS(1) [],
            RxDescThldStatEn OFFSET(11) NUMBITS(1) [],
            IbiThldStatEn OFFSET(12) NUMBITS(1) [],
            IbiDoneEn OFFSET(13) NUMBITS(1) [],
            TransferAbortStatEn OFFSET(25) NUMBITS(1) [],
            TransferErrStatEn OFFSET(31) NUMBITS(1) [],
        ],
        pub TtiQueueSize [
            RxDescBufferSize OFFSET(0) NUMBITS(8) [],
            TxDescBufferSize OFFSET(8) NUMBITS(8) [],
            RxDataBufferSize OFFSET(16) NUMBITS(8) [],
            TxDataBufferSize OFFSET(24) NUMBITS(8) [],
        ],
        pub TtiIbiQueueSize [
            IbiQueueSize OFFSET(0) NUMBITS(8) [],
        ],
        pub TtiQueueThldCtrl [
            TxDescThld OFFSET(0) NUMBITS(8) [],
            RxDescThld OFFSET(8) NUMBITS(8) [],
            IbiThld OFFSET(24) NUMBITS(8) [],
        ],
        pub TtiDataBufferThldCtrl [
            TxDataThld OFFSET(0) NUMBITS(3) [],
            RxDataThld OFFSET(8) NUMBITS(3) [],
            TxStartThld OFFSET(16) NUMBITS(3) [],
            RxStartThld OFFSET(24) NUMBITS(3) [],
        ],
    }
}
