//! Bus discovery against a simulated bus

use civ_detect::{DeviceProbe, ProbeConfig, ProbeRecord, ProbedModel};
use civ_protocol::Accessory;
use civ_sim::{Fault, SimulatedAccessory, SimulatedBus, SimulatedRig, SimulatedRigConfig};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Bus behind an echoing interface, like a real single-wire CI-V line
fn echo_bus(rig: SimulatedRig) -> SimulatedBus {
    init_tracing();
    let bus = SimulatedBus::with_rig(rig);
    bus.set_echo(true);
    bus
}

#[test]
fn test_finds_rig_at_its_speed_only() {
    let mut bus = echo_bus(SimulatedRig::at(0x58, 9600));
    let mut reported = Vec::new();

    let outcome = DeviceProbe::new()
        .probe(&mut bus, |record| reported.push(record.clone()))
        .unwrap()
        .expect("device not found");

    assert_eq!(outcome.baud_rate, 9600);
    assert_eq!(
        outcome.records,
        vec![ProbeRecord {
            address: 0x58,
            identity: vec![0x58],
            baud_rate: 9600,
            model: ProbedModel::Rig("IC-706MKIIG"),
        }]
    );
    assert_eq!(reported, outcome.records);
    // 300 baud is never tried once something answered
    assert_eq!(bus.opened_rates(), vec![19200, 9600]);
}

#[test]
fn test_sweeps_every_address() {
    let mut bus = echo_bus(SimulatedRig::at(0x58, 19200));
    DeviceProbe::new().probe(&mut bus, |_| {}).unwrap();

    let frames = bus.sent_frames();
    // 127 rig addresses, 16 accessory addresses
    assert_eq!(frames.len(), 127 + 16);
    assert_eq!(frames[0].dest(), 0x01);
    assert_eq!(frames[126].dest(), 0x7F);
    assert_eq!(frames[127].dest(), 0x80);
    assert!(frames[..127].iter().all(|f| f.cmd() == 0x19 && f.body() == [0x00]));
    assert!(frames[127..].iter().all(|f| f.cmd() == 0x7F && f.body() == [0x09]));
}

#[test]
fn test_nak_infers_identity_from_address() {
    let rig = SimulatedRig::new(SimulatedRigConfig {
        address: 0x76,
        identity: 0x76,
        baud_rate: 19200,
        supports_read_id: false,
        ..Default::default()
    });
    let mut bus = echo_bus(rig);

    let outcome = DeviceProbe::new().probe(&mut bus, |_| {}).unwrap().unwrap();
    assert_eq!(outcome.records[0].identity, vec![0x76]);
    assert_eq!(outcome.records[0].model, ProbedModel::Rig("IC-7200"));
}

#[test]
fn test_unknown_identity_still_reported() {
    let rig = SimulatedRig::new(SimulatedRigConfig {
        address: 0x40,
        identity: 0x41,
        baud_rate: 19200,
        ..Default::default()
    });
    let mut bus = echo_bus(rig);

    let outcome = DeviceProbe::new().probe(&mut bus, |_| {}).unwrap().unwrap();
    let record = &outcome.records[0];
    assert_eq!(record.address, 0x40);
    assert_eq!(record.identity, vec![0x41]);
    assert_eq!(record.model, ProbedModel::Unknown);
    assert_eq!(record.model_name(), None);
}

#[test]
fn test_several_rigs_on_one_bus() {
    let bus = echo_bus(SimulatedRig::at(0x58, 9600));
    bus.add_rig(SimulatedRig::at(0x94, 9600));
    let mut opener = bus.clone();

    let outcome = DeviceProbe::new().probe(&mut opener, |_| {}).unwrap().unwrap();
    let addresses: Vec<u8> = outcome.records.iter().map(|r| r.address).collect();
    assert_eq!(addresses, vec![0x58, 0x94]);
    assert_eq!(outcome.records[1].model_name(), Some("IC-7300"));
}

#[test]
fn test_accessory_identified() {
    let bus = echo_bus(SimulatedRig::at(0x58, 9600));
    bus.add_accessory(SimulatedAccessory::new(0x82, 9600, "535"));
    let mut opener = bus.clone();

    let outcome = DeviceProbe::new().probe(&mut opener, |_| {}).unwrap().unwrap();
    assert_eq!(outcome.records.len(), 2);
    let accessory = &outcome.records[1];
    assert_eq!(accessory.address, 0x82);
    // "535", software 1.0, interface 2.0
    assert_eq!(accessory.identity, vec![0x35, 0x33, 0x35, 0x10, 0x20]);
    assert_eq!(
        accessory.model,
        ProbedModel::Accessory {
            kind: Accessory::OptoScan535,
            software_version: (1, 0),
            interface_version: (2, 0),
        }
    );
}

#[test]
fn test_unrecognised_accessory_ignored() {
    init_tracing();
    let mut bus = SimulatedBus::new();
    bus.set_echo(true);
    bus.add_accessory(SimulatedAccessory::new(0x80, 19200, "999"));

    assert_eq!(DeviceProbe::new().probe(&mut bus, |_| {}).unwrap(), None);
}

#[test]
fn test_empty_bus_tries_every_speed() {
    init_tracing();
    let mut bus = SimulatedBus::new();
    bus.set_echo(true);

    assert_eq!(DeviceProbe::new().probe(&mut bus, |_| {}).unwrap(), None);
    assert_eq!(bus.opened_rates(), vec![19200, 9600, 300]);
}

#[test]
fn test_interface_without_echo() {
    init_tracing();
    let mut bus = SimulatedBus::with_rig(SimulatedRig::at(0x58, 19200));
    let config = ProbeConfig {
        echo: false,
        ..Default::default()
    };

    let outcome = DeviceProbe::with_config(config)
        .probe(&mut bus, |_| {})
        .unwrap()
        .unwrap();
    assert_eq!(outcome.baud_rate, 19200);
    assert_eq!(outcome.records[0].model, ProbedModel::Rig("IC-706MKIIG"));
}

#[test]
fn test_garbled_reply_abandons_speed() {
    let mut bus = echo_bus(SimulatedRig::at(0x58, 9600));
    // Frequency data instead of an identity: FE FE E0 01 03 00 FD
    bus.schedule_fault(0, Fault::Reply(vec![0xFE, 0xFE, 0xE0, 0x01, 0x03, 0x00, 0xFD]));

    let outcome = DeviceProbe::new().probe(&mut bus, |_| {}).unwrap().unwrap();
    assert_eq!(outcome.baud_rate, 9600);
    assert_eq!(bus.opened_rates(), vec![19200, 9600]);
    // Only the first address was asked at 19200
    assert_eq!(bus.sent_frames().len(), 1 + 127 + 16);
}

#[test]
fn test_narrow_address_range() {
    let mut bus = echo_bus(SimulatedRig::at(0x58, 19200));
    let config = ProbeConfig {
        baud_rates: vec![19200],
        rig_addresses: 0x50..=0x5F,
        accessory_addresses: 0x80..=0x80,
        ..Default::default()
    };

    let outcome = DeviceProbe::with_config(config)
        .probe(&mut bus, |_| {})
        .unwrap()
        .unwrap();
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(bus.sent_frames().len(), 16 + 1);
}
