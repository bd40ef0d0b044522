// src/pipeline/medical.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Medical stage graph
//!
//! ```text
//! departments -> doctors ─┐
//! patients ───────────────┴─> appointments
//! ```

use std::sync::OnceLock;

use super::cancel::CancelToken;
use super::errors::ErrorCollector;
use super::graph::{StageReport, TaskGraph};
use super::sinks::{publish, SinkSet};
use super::{sealed, RunContext};
use crate::config::MedicalCounts;
use crate::dimension::Dimension;
use crate::domains::medical::{generate_departments, generate_doctors, generate_patients};
use crate::error::Result;
use crate::facts::{generate_appointments, AppointmentInputs};
use crate::records::{Appointment, Department, Doctor, Patient};

pub(super) fn run(
    ctx: &RunContext<'_>,
    counts: &MedicalCounts,
    sinks: &mut SinkSet,
    cancel: &CancelToken,
    errors: &ErrorCollector,
) -> Result<Vec<StageReport>> {
    let departments_tx = sinks.open::<Department>("departments")?;
    let doctors_tx = sinks.open::<Doctor>("doctors")?;
    let patients_tx = sinks.open::<Patient>("patients")?;
    let appointments_tx = sinks.open::<Appointment>("appointments")?;

    let departments: OnceLock<Dimension<Department>> = OnceLock::new();
    let doctors: OnceLock<Dimension<Doctor>> = OnceLock::new();
    let patients: OnceLock<Dimension<Patient>> = OnceLock::new();
    let (departments, doctors, patients) = (&departments, &doctors, &patients);

    let mut graph = TaskGraph::new();

    graph.add("departments", &[], move |cancel| {
        let dim = generate_departments(counts.departments);
        publish(&departments_tx, "departments", dim.rows(), cancel)?;
        let _ = departments.set(dim);
        Ok(())
    });

    graph.add("doctors", &["departments"], move |cancel| {
        let departments = sealed(departments, "departments")?;
        let dim = ctx
            .pool
            .install(|| generate_doctors(counts.doctors, departments, ctx.seed))?;
        publish(&doctors_tx, "doctors", dim.rows(), cancel)?;
        let _ = doctors.set(dim);
        Ok(())
    });

    graph.add("patients", &[], move |cancel| {
        let dim = ctx
            .pool
            .install(|| generate_patients(counts.patients, ctx.seed));
        publish(&patients_tx, "patients", dim.rows(), cancel)?;
        let _ = patients.set(dim);
        Ok(())
    });

    graph.add("appointments", &["patients", "doctors"], move |cancel| {
        let patients = sealed(patients, "patients")?;
        let doctors = sealed(doctors, "doctors")?;
        let inputs = AppointmentInputs {
            patient_ids: patients.keys(),
            doctors: doctors.rows(),
        };
        generate_appointments(
            counts.appointments,
            inputs,
            appointments_tx,
            &ctx.fact_options(cancel),
        )?;
        Ok(())
    });

    graph.run(cancel, errors)
}
