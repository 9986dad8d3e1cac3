//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Wire constants for the hypervisor line protocol

/// Carriage Return
pub const CR: u8 = b'\r';
/// Line Feed
pub const LF: u8 = b'\n';

/// Prefix of the line that completes a successful reply
pub const SUCCESS_TERMINATOR: &str = "100-";

/// Separator following the three digit status code of a terminal line
pub const CODE_SEPARATOR: u8 = b'-';

/// Length of a status code prefix including its separator (`"100-"`)
pub const CODE_PREFIX_LEN: usize = 4;

/// Default upper bound on the number of lines accumulated for a single reply
pub const DEFAULT_MAX_LINES: usize = 65_536;
