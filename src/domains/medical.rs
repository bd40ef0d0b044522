// src/domains/medical.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Medical dimensions: departments, doctors and patients

use rand::Rng;
use rayon::prelude::*;

use crate::constants::streams;
use crate::dimension::Dimension;
use crate::error::Result;
use crate::records::{day, Department, Doctor, Patient, DATA_EPOCH_DAY};
use crate::rng::derive_rng;
use crate::vocab::{self, pick};

/// Patients are born within ~90 years before the data epoch
const BIRTH_SPAN_DAYS: i64 = 90 * 365;

pub fn generate_departments(count: usize) -> Dimension<Department> {
    let rows: Vec<Department> = (0..count)
        .map(|i| Department {
            department_id: i as i64 + 1,
            name: vocab::cycled_name(vocab::DEPARTMENTS, i),
        })
        .collect();
    Dimension::seal(rows)
}

/// Generate doctors, each assigned to a department of the sealed dimension
pub fn generate_doctors(
    count: usize,
    departments: &Dimension<Department>,
    seed: u64,
) -> Result<Dimension<Doctor>> {
    let department_sampler = departments.keys().sampler()?;

    let rows: Vec<Doctor> = (0..count)
        .into_par_iter()
        .map(|i| {
            let mut rng = derive_rng(seed, streams::DOCTORS, i as u64);
            Doctor {
                doctor_id: i as i64 + 1,
                department_id: department_sampler.sample(&mut rng),
                first_name: pick(&mut rng, vocab::FIRST_NAMES).to_string(),
                last_name: pick(&mut rng, vocab::LAST_NAMES).to_string(),
            }
        })
        .collect();
    Ok(Dimension::seal(rows))
}

pub fn generate_patients(count: usize, seed: u64) -> Dimension<Patient> {
    let rows: Vec<Patient> = (0..count)
        .into_par_iter()
        .map(|i| {
            let mut rng = derive_rng(seed, streams::PATIENTS, i as u64);
            Patient {
                patient_id: i as i64 + 1,
                first_name: pick(&mut rng, vocab::FIRST_NAMES).to_string(),
                last_name: pick(&mut rng, vocab::LAST_NAMES).to_string(),
                birth_date: day(DATA_EPOCH_DAY - rng.random_range(0..BIRTH_SPAN_DAYS)),
            }
        })
        .collect();
    Dimension::seal(rows)
}
