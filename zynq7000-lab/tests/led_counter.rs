mod common;

use std::sync::atomic::Ordering;

use common::{Event, MockCpu, MockGic, MockLeds, MockTimer, event_log, events};
use zynq7000_lab::{
    config::zedboard,
    counter::{
        CounterPeripherals, InterruptLine, SetupFault, SetupStage, TickCounter, TickSlot,
        TimerState, start_periodic_counter,
    },
    gic::BindingTable,
};

const TIMER_LINE: InterruptLine = InterruptLine::CPU_PRIVATE_TIMER;

#[test]
fn setup_order() {
    static BINDINGS: BindingTable = BindingTable::new();
    static SLOT: TickSlot<MockTimer, MockLeds> = TickSlot::new();
    static COUNTER: TickCounter = TickCounter::new();
    fn on_tick() {
        SLOT.on_interrupt();
    }

    let log = event_log();
    let mut gic = MockGic::new(&log, &BINDINGS);
    let mut cpu = MockCpu { log: log.clone() };
    let peripherals = CounterPeripherals {
        timer: MockTimer::new(&log),
        leds: MockLeds::new(&log),
        irq: &mut gic,
        cpu: &mut cpu,
    };
    let state = unsafe {
        start_periodic_counter(&zedboard::COUNTER, peripherals, &SLOT, &COUNTER, on_tick)
    };
    assert_eq!(state, Ok(TimerState::Running));
    assert_eq!(
        events(&log),
        vec![
            Event::LedInit,
            Event::LedDirection(0),
            Event::TimerLookup,
            Event::TimerInit,
            Event::TimerSelfTest,
            Event::TimerAutoReload,
            Event::TimerLoad(333_333_332),
            Event::TimerInterruptEnable,
            Event::IrqLookup,
            Event::IrqInit,
            Event::IrqConnect(29),
            Event::IrqEnable(29),
            Event::TimerStart,
            Event::CpuEnable,
        ]
    );
    assert!(BINDINGS.is_bound(TIMER_LINE));
    assert_eq!(SLOT.with(|handler| handler.counter().get()), Some(0));
}

#[test]
fn counts_ticks_and_mirrors_them_to_the_leds() {
    static BINDINGS: BindingTable = BindingTable::new();
    static SLOT: TickSlot<MockTimer, MockLeds> = TickSlot::new();
    static COUNTER: TickCounter = TickCounter::new();
    fn on_tick() {
        SLOT.on_interrupt();
    }

    let log = event_log();
    let timer = MockTimer::new(&log);
    let expired = timer.expired.clone();
    let leds = MockLeds::new(&log);
    let led_value = leds.value.clone();
    let mut gic = MockGic::new(&log, &BINDINGS);
    let mut cpu = MockCpu { log: log.clone() };
    let peripherals = CounterPeripherals {
        timer,
        leds,
        irq: &mut gic,
        cpu: &mut cpu,
    };
    let state = unsafe {
        start_periodic_counter(&zedboard::COUNTER, peripherals, &SLOT, &COUNTER, on_tick)
    };
    assert_eq!(state, Ok(TimerState::Running));

    for tick in 1..=300u32 {
        expired.store(true, Ordering::SeqCst);
        assert!(BINDINGS.dispatch(TIMER_LINE));
        assert!(!expired.load(Ordering::SeqCst));
        assert_eq!(COUNTER.get(), tick);
        assert_eq!(*led_value.lock().unwrap(), tick & 0xFF);
    }

    // The expiry flag is cleared before the LEDs are updated.
    let log = events(&log);
    let clear = log.iter().rposition(|e| *e == Event::TimerClear).unwrap();
    assert_eq!(log[clear + 1], Event::LedWrite(300 & 0xFF));
}

#[test]
fn spurious_interrupt_is_not_counted() {
    static BINDINGS: BindingTable = BindingTable::new();
    static SLOT: TickSlot<MockTimer, MockLeds> = TickSlot::new();
    static COUNTER: TickCounter = TickCounter::new();
    fn on_tick() {
        SLOT.on_interrupt();
    }

    let log = event_log();
    let timer = MockTimer::new(&log);
    let expired = timer.expired.clone();
    let mut gic = MockGic::new(&log, &BINDINGS);
    let mut cpu = MockCpu { log: log.clone() };
    let peripherals = CounterPeripherals {
        timer,
        leds: MockLeds::new(&log),
        irq: &mut gic,
        cpu: &mut cpu,
    };
    let state = unsafe {
        start_periodic_counter(&zedboard::COUNTER, peripherals, &SLOT, &COUNTER, on_tick)
    };
    assert_eq!(state, Ok(TimerState::Running));
    let setup_events = events(&log).len();

    assert!(!SLOT.on_interrupt());
    assert!(BINDINGS.dispatch(TIMER_LINE));
    assert_eq!(COUNTER.get(), 0);
    assert_eq!(events(&log).len(), setup_events);

    expired.store(true, Ordering::SeqCst);
    assert!(SLOT.on_interrupt());
    assert_eq!(COUNTER.get(), 1);
    // Unbound lines are not dispatched.
    assert!(!BINDINGS.dispatch(InterruptLine(61)));
}

#[test]
fn timer_failure_skips_interrupt_wiring() {
    for stage in [
        SetupStage::TimerLookup,
        SetupStage::TimerInit,
        SetupStage::TimerSelfTest,
    ] {
        static BINDINGS: BindingTable = BindingTable::new();
        static SLOT: TickSlot<MockTimer, MockLeds> = TickSlot::new();
        static COUNTER: TickCounter = TickCounter::new();
        fn on_tick() {
            SLOT.on_interrupt();
        }

        let log = event_log();
        let mut timer = MockTimer::new(&log);
        timer.fail_at = Some(stage);
        let mut gic = MockGic::new(&log, &BINDINGS);
        let mut cpu = MockCpu { log: log.clone() };
        let peripherals = CounterPeripherals {
            timer,
            leds: MockLeds::new(&log),
            irq: &mut gic,
            cpu: &mut cpu,
        };
        let result = unsafe {
            start_periodic_counter(&zedboard::COUNTER, peripherals, &SLOT, &COUNTER, on_tick)
        };
        assert_eq!(result, Err(SetupFault { stage }));

        let log = events(&log);
        assert!(!log.iter().any(|e| matches!(
            e,
            Event::IrqLookup
                | Event::IrqInit
                | Event::IrqConnect(_)
                | Event::IrqEnable(_)
                | Event::TimerStart
                | Event::CpuEnable
        )));
        assert!(BINDINGS.is_empty());
        assert!(SLOT.with(|_| ()).is_none());
    }
}

#[test]
fn interrupt_controller_failure_aborts_setup() {
    for stage in [
        SetupStage::IrqLookup,
        SetupStage::IrqInit,
        SetupStage::IrqConnect,
    ] {
        static BINDINGS: BindingTable = BindingTable::new();
        static SLOT: TickSlot<MockTimer, MockLeds> = TickSlot::new();
        static COUNTER: TickCounter = TickCounter::new();
        fn on_tick() {
            SLOT.on_interrupt();
        }

        let log = event_log();
        let mut gic = MockGic::new(&log, &BINDINGS);
        gic.fail_at = Some(stage);
        let mut cpu = MockCpu { log: log.clone() };
        let peripherals = CounterPeripherals {
            timer: MockTimer::new(&log),
            leds: MockLeds::new(&log),
            irq: &mut gic,
            cpu: &mut cpu,
        };
        let result = unsafe {
            start_periodic_counter(&zedboard::COUNTER, peripherals, &SLOT, &COUNTER, on_tick)
        };
        assert_eq!(result, Err(SetupFault { stage }));

        let log = events(&log);
        assert!(!log.contains(&Event::TimerStart));
        assert!(!log.contains(&Event::CpuEnable));
        assert!(SLOT.with(|_| ()).is_none());
    }
}

#[test]
fn led_failure_aborts_before_timer_setup() {
    static BINDINGS: BindingTable = BindingTable::new();
    static SLOT: TickSlot<MockTimer, MockLeds> = TickSlot::new();
    static COUNTER: TickCounter = TickCounter::new();
    fn on_tick() {
        SLOT.on_interrupt();
    }

    let log = event_log();
    let mut leds = MockLeds::new(&log);
    leds.fail_init = true;
    let mut gic = MockGic::new(&log, &BINDINGS);
    let mut cpu = MockCpu { log: log.clone() };
    let peripherals = CounterPeripherals {
        timer: MockTimer::new(&log),
        leds,
        irq: &mut gic,
        cpu: &mut cpu,
    };
    let result = unsafe {
        start_periodic_counter(&zedboard::COUNTER, peripherals, &SLOT, &COUNTER, on_tick)
    };
    assert_eq!(
        result,
        Err(SetupFault {
            stage: SetupStage::LedInit
        })
    );
    assert_eq!(events(&log), vec![Event::LedInit]);
}
