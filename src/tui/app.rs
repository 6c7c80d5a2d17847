//! Debugger application state and logic.

use crate::asm::disasm::{disassemble_instruction, listing};
use crate::cpu::{Address, Cpu, Word, MEMORY_SIZE};
use log::error;
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Shortest delay between steps while running.
pub const MIN_DELAY: Duration = Duration::from_millis(0);
/// Longest delay between steps while running.
pub const MAX_DELAY: Duration = Duration::from_millis(1000);
const DELAY_STEP: Duration = Duration::from_millis(50);

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged.
    pub cpu: Cpu,
    /// Original program for reloading.
    pub program: Vec<Word>,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<Address>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
    /// Delay between steps while running.
    pub delay: Duration,
    last_step: Option<Instant>,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<Word>) -> Self {
        let mut app = Self {
            cpu: Cpu::new(),
            program,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: String::new(),
            mem_scroll: 0,
            delay: Duration::from_millis(500),
            last_step: None,
        };
        app.reload();
        if app.cpu.is_running() {
            app.status = "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into();
        }
        app
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.cpu.is_running() {
            self.status = "Program finished. Press 'x' to reset.".into();
            self.running = false;
            return;
        }

        let pc = self.cpu.regs.pc;
        let pc_index = usize::try_from(pc).unwrap_or(MEMORY_SIZE);
        let (text, _) = disassemble_instruction(self.cpu.mem.cells(), pc_index);
        match self.cpu.step() {
            Ok(true) => {
                self.status = format!("PC={:04}: {}", pc, text);
            }
            Ok(false) => {
                self.status = format!("Halted after {} cycles", self.cpu.cycles);
                self.running = false;
            }
            Err(e) => {
                error!("fault at PC={}: {}", pc, e);
                self.status = format!("Error at PC={}: {}", pc, e);
                self.running = false;
            }
        }
    }

    /// Start continuous execution.
    pub fn run(&mut self) {
        if !self.cpu.is_running() {
            self.status = "Reset before running again.".into();
            return;
        }
        self.running = true;
        self.last_step = None;
        self.status = "Running...".into();
    }

    /// Stop continuous execution.
    pub fn pause(&mut self) {
        self.running = false;
        self.status = "Paused.".into();
    }

    /// Run one iteration of continuous execution, honouring the delay.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if let Some(last) = self.last_step {
            if last.elapsed() < self.delay {
                return;
            }
        }

        // Check for breakpoint (but never stall on the one we just left)
        let pc = self.cpu.regs.pc;
        if self.last_step.is_some() && self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={}", pc);
            return;
        }

        self.last_step = Some(Instant::now());
        self.step();
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.regs.pc;
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={}", pc);
        }
    }

    /// Restart the program in memory without reloading it.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.running = false;
        self.status = "Reset. Memory kept.".into();
    }

    /// Reload the original program, discarding memory changes.
    pub fn reload(&mut self) {
        self.running = false;
        self.status = match self.cpu.load(&self.program) {
            Ok(()) => "Program reloaded.".into(),
            Err(e) => format!("Load failed: {}", e),
        };
    }

    /// Step faster.
    pub fn faster(&mut self) {
        self.delay = self.delay.saturating_sub(DELAY_STEP).max(MIN_DELAY);
        self.status = format!("Delay: {} ms", self.delay.as_millis());
    }

    /// Step slower.
    pub fn slower(&mut self) {
        self.delay = (self.delay + DELAY_STEP).min(MAX_DELAY);
        self.status = format!("Delay: {} ms", self.delay.as_millis());
    }

    /// Scroll the memory view.
    pub fn scroll(&mut self, delta: isize) {
        let max = MEMORY_SIZE - 1;
        self.mem_scroll = self.mem_scroll.saturating_add_signed(delta).min(max);
    }

    /// Get disassembly around current PC.
    ///
    /// Decoding restarts from address 0 so operands are never shown as
    /// opcodes.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(Address, String, bool)> {
        let pc = self.cpu.regs.pc;
        let pc_index = usize::try_from(pc).unwrap_or(usize::MAX);
        let all = listing(self.cpu.mem.cells());
        let current = all
            .iter()
            .position(|(addr, _, len)| (*addr..*addr + *len).contains(&pc_index))
            .unwrap_or(0);
        let start = current.saturating_sub(lines / 2);

        all.into_iter()
            .skip(start)
            .take(lines)
            .map(|(addr, text, _)| {
                let addr = addr as Address;
                (addr, text, addr == pc)
            })
            .collect()
    }

    /// Words around SP, top of stack first.
    pub fn get_stack(&self, lines: usize) -> Vec<(Address, Word)> {
        let top = MEMORY_SIZE as Address - 1;
        ((self.cpu.regs.sp + 1)..=top)
            .take(lines)
            .filter_map(|addr| self.cpu.mem.read(addr).ok().map(|w| (addr, w)))
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<Word>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create app
    let mut app = DebuggerApp::new(program);

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        // Handle input
        if event::poll(Duration::from_millis(10))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => app.pause(),
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Char('l') => app.reload(),
                        KeyCode::Char('+') => app.faster(),
                        KeyCode::Char('-') => app.slower(),
                        KeyCode::Up => app.scroll(-1),
                        KeyCode::Down => app.scroll(1),
                        KeyCode::PageUp => app.scroll(-16),
                        KeyCode::PageDown => app.scroll(16),
                        _ => {}
                    }
                }
            }
        }

        // Tick for continuous running
        app.tick();

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
