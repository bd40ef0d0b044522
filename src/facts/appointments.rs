// src/facts/appointments.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Appointments between patients and doctors
//!
//! Appointment ids equal the global row index; each worker walks its range
//! with a [`LocalIdGenerator`]. The department of an appointment is always the
//! department of its doctor.

use std::collections::HashMap;

use crossbeam_channel::Sender;
use rand::Rng;

use super::{check_cancelled, fan_out, FactOptions, FactStats};
use crate::constants::streams;
use crate::error::{GenError, Result};
use crate::ids::LocalIdGenerator;
use crate::partition::WorkerRange;
use crate::pipeline::cancel::CancelToken;
use crate::records::{
    instant, Appointment, AppointmentStatus, Doctor, ORDER_WINDOW_DAYS, ORDER_WINDOW_START_DAY,
};
use crate::rng::{derive_rng, resolve_seed};
use crate::sampler::WeightedSampler;

const DURATIONS: [u32; 4] = [15, 30, 45, 60];

/// Sealed dimension data the appointment generator reads
#[derive(Debug, Clone, Copy)]
pub struct AppointmentInputs<'a> {
    pub patient_ids: &'a [i64],
    pub doctors: &'a [Doctor],
}

/// Generate `total_count` appointments, consuming the sender
pub fn generate_appointments(
    total_count: u64,
    inputs: AppointmentInputs<'_>,
    tx: Sender<Appointment>,
    options: &FactOptions,
) -> Result<FactStats> {
    if total_count == 0 {
        return Err(GenError::config("appointment count must be positive"));
    }
    if inputs.doctors.is_empty() {
        return Err(GenError::config("appointments need at least one doctor"));
    }
    let doctor_ids: Vec<i64> = inputs.doctors.iter().map(|d| d.doctor_id).collect();

    let worker = AppointmentWorker {
        patients: WeightedSampler::new(inputs.patient_ids)?,
        doctors: WeightedSampler::new(&doctor_ids)?,
        departments: inputs
            .doctors
            .iter()
            .map(|d| (d.doctor_id, d.department_id))
            .collect(),
        tx,
        seed: resolve_seed(options.seed),
    };

    let stats = fan_out(
        "appointments",
        total_count,
        options.workers(),
        &options.cancel,
        |range| worker.run(range, &options.cancel),
    )?;
    tracing::info!("Generated {} appointments", stats.rows);
    Ok(stats)
}

struct AppointmentWorker {
    patients: WeightedSampler,
    doctors: WeightedSampler,
    departments: HashMap<i64, i64>,
    tx: Sender<Appointment>,
    seed: u64,
}

impl AppointmentWorker {
    fn run(&self, range: WorkerRange, cancel: &CancelToken) -> Result<FactStats> {
        let ids = LocalIdGenerator::new(range.start as i64, range.end() as i64);
        let mut stats = FactStats::default();

        for appointment_id in ids {
            check_cancelled(cancel)?;
            let mut rng = derive_rng(self.seed, streams::APPOINTMENTS, appointment_id as u64);

            let doctor_id = self.doctors.sample(&mut rng);
            let department_id = *self.departments.get(&doctor_id).ok_or_else(|| {
                GenError::Consistency(format!("doctor {doctor_id} has no department"))
            })?;

            // Working hours, quarter-hour slots
            let slot_day = ORDER_WINDOW_START_DAY + rng.random_range(0..ORDER_WINDOW_DAYS);
            let slot_minute = rng.random_range(8 * 60 / 15..17 * 60 / 15) * 15;

            let appointment = Appointment {
                appointment_id,
                patient_id: self.patients.sample(&mut rng),
                doctor_id,
                department_id,
                scheduled_at: instant(slot_day * 86_400 + slot_minute * 60),
                duration_minutes: DURATIONS[rng.random_range(0..DURATIONS.len())],
                status: appointment_status(&mut rng),
            };
            self.tx.send(appointment).map_err(|_| GenError::ChannelClosed {
                table: "appointments".to_string(),
            })?;
            stats.rows += 1;
        }
        Ok(stats)
    }
}

fn appointment_status<R: Rng + ?Sized>(rng: &mut R) -> AppointmentStatus {
    match rng.random_range(0..100) {
        0..=69 => AppointmentStatus::Completed,
        70..=84 => AppointmentStatus::Scheduled,
        85..=94 => AppointmentStatus::Cancelled,
        _ => AppointmentStatus::NoShow,
    }
}
