use lc3sim::image;
use lc3sim::io::BufferedConsole;
use lc3sim::{Flag, Memory, RunState, SimError, Status};

fn load(words: &[u16]) -> RunState {
    let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_be_bytes()).collect();
    let mut mem = Memory::new();
    image::load_bytes(&bytes, &mut mem).unwrap();
    RunState::new(mem)
}

#[test]
fn clear_and_halt() {
    // AND R0, R0, #0 ; HALT
    let mut state = load(&[0x3000, 0x5020, 0xF025]);
    state.set_reg(0, 0x1234);
    let mut io = BufferedConsole::default();
    assert_eq!(state.run(&mut io).unwrap(), 2);
    assert_eq!(state.status(), Status::Halted);
    assert_eq!(state.reg(0), 0);
    assert_eq!(state.flag(), Flag::Z);
    assert_eq!(io.output_string(), "HALT\n");
}

#[test]
fn reserved_opcode_executes_nothing() {
    let mut state = load(&[0x3000, 0xD000, 0x1021]);
    let mut io = BufferedConsole::default();
    let err = state.run(&mut io).unwrap_err();
    assert!(matches!(err, SimError::IllegalOpcode { addr: 0x3000, .. }));
    assert_eq!(state.reg(0), 0);
    assert_eq!(state.pc(), 0x3001);
}

#[test]
fn counts_down_loop() {
    // 0x3000 AND R0, R0, #0
    // 0x3001 ADD R0, R0, #5
    // 0x3002 ADD R1, R1, #2
    // 0x3003 ADD R0, R0, #-1
    // 0x3004 BRp #-3
    // 0x3005 HALT
    let mut state = load(&[0x3000, 0x5020, 0x1025, 0x1262, 0x103F, 0x03FD, 0xF025]);
    let mut io = BufferedConsole::default();
    state.run(&mut io).unwrap();
    assert_eq!(state.reg(0), 0);
    assert_eq!(state.reg(1), 10);
}

#[test]
fn subroutine_round_trip() {
    // 0x3000 JSR #2
    // 0x3001 ADD R2, R2, #1
    // 0x3002 HALT
    // 0x3003 ADD R3, R3, #7
    // 0x3004 RET
    let mut state = load(&[0x3000, 0x4802, 0x14A1, 0xF025, 0x16E7, 0xC1C0]);
    let mut io = BufferedConsole::default();
    state.run(&mut io).unwrap();
    assert_eq!(state.reg(3), 7);
    assert_eq!(state.reg(2), 1);
}

#[test]
fn prompts_for_input() {
    // IN ; HALT
    let mut state = load(&[0x3000, 0xF023, 0xF025]);
    let mut io = BufferedConsole::new("x");
    state.run(&mut io).unwrap();
    assert_eq!(state.reg(0), b'x' as u16);
    assert_eq!(io.output_string(), "Enter a character: xHALT\n");
}
