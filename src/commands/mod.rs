// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod advice;
pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod status;
pub mod transactions;
