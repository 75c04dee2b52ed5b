//! Flash write program image

/// Revision of [`FLASH_WRITE_PROGRAM`]
///
/// Bump whenever the image or its register contract changes.
pub const FLASH_WRITE_PROGRAM_VERSION: u32 = 2;

/// Thumb-1 flash write loop for the EFR32 MSC
///
/// Register contract at entry:
///
/// | Reg | In                         | Out                      |
/// |-----|----------------------------|--------------------------|
/// | r0  | MSC register base          | last MSC status          |
/// | r1  | number of words to write   | words left               |
/// | r2  | ring buffer start          |                          |
/// | r3  | ring buffer end            |                          |
/// | r4  | destination flash address  | address reached          |
///
/// For every word the program waits until the write pointer differs from
/// the read pointer, latches r4, stops if the MSC reports `LOCKED` or
/// `INVADDR`, writes the word once `WDATAREADY` is set, waits for `BUSY`
/// to clear and only then advances the read pointer (wrapping to
/// `r2 + 8`). On error it stores 0 to the read pointer. It always ends on
/// `bkpt #0`. The trailing word is the MSC lock key literal.
pub const FLASH_WRITE_PROGRAM: [u8; 92] = [
    0x15, 0x4e, // ldr   r6, =LOCK_KEY
    0x06, 0x64, // str   r6, [r0, #0x40]     MSC_LOCK
    0x01, 0x26, // movs  r6, #1
    0x86, 0x60, // str   r6, [r0, #0x08]     MSC_WRITECTRL
    // wait_fifo:
    0x16, 0x68, // ldr   r6, [r2, #0]
    0x00, 0x2e, // cmp   r6, #0
    0x22, 0xd0, // beq   exit
    0x55, 0x68, // ldr   r5, [r2, #4]
    0xb5, 0x42, // cmp   r5, r6
    0xf9, 0xd0, // beq   wait_fifo
    0x04, 0x61, // str   r4, [r0, #0x10]     MSC_ADDRB
    0x01, 0x26, // movs  r6, #1
    0xc6, 0x60, // str   r6, [r0, #0x0c]     MSC_WRITECMD
    0xc6, 0x69, // ldr   r6, [r0, #0x1c]     MSC_STATUS
    0x06, 0x27, // movs  r7, #6
    0x3e, 0x42, // tst   r6, r7
    0x16, 0xd1, // bne   error
    // wait_wdataready:
    0xc6, 0x69, // ldr   r6, [r0, #0x1c]
    0x08, 0x27, // movs  r7, #8
    0x3e, 0x42, // tst   r6, r7
    0xfb, 0xd0, // beq   wait_wdataready
    0x2e, 0x68, // ldr   r6, [r5]
    0x86, 0x61, // str   r6, [r0, #0x18]     MSC_WDATA
    0x08, 0x26, // movs  r6, #8
    0xc6, 0x60, // str   r6, [r0, #0x0c]
    0x04, 0x35, // adds  r5, #4
    0x04, 0x34, // adds  r4, #4
    // busy:
    0xc6, 0x69, // ldr   r6, [r0, #0x1c]
    0x01, 0x27, // movs  r7, #1
    0x3e, 0x42, // tst   r6, r7
    0xfb, 0xd1, // bne   busy
    0x9d, 0x42, // cmp   r5, r3
    0x01, 0xd3, // bcc   no_wrap
    0x15, 0x46, // mov   r5, r2
    0x08, 0x35, // adds  r5, #8
    // no_wrap:
    0x55, 0x60, // str   r5, [r2, #4]
    0x01, 0x39, // subs  r1, r1, #1
    0x00, 0x29, // cmp   r1, #0
    0x02, 0xd0, // beq   exit
    0xdb, 0xe7, // b     wait_fifo
    // error:
    0x00, 0x20, // movs  r0, #0
    0x50, 0x60, // str   r0, [r2, #4]
    // exit:
    0x30, 0x46, // mov   r0, r6
    0x00, 0xbe, // bkpt  #0
    // LOCK_KEY
    0x71, 0x1b, 0x00, 0x00,
];
