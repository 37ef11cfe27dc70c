// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./macros_test.rs"]
mod macros_test;

// Every macro evaluates its operands before touching the target, so the operands may borrow the
// target (e.g. `expect!(ctx, ctx.calls().call_count("write") == 2)`).

#[macro_export]
macro_rules! expect {
  ($target:expr, $condition:expr $(,)?) => {{
    use $crate::Expect as _;
    let passed: bool = $condition;
    $target.check(
      stringify!($condition),
      passed,
      (!passed).then(|| format!("expected `{}`", stringify!($condition))),
      concat!(file!(), ":", line!()),
    )
  }};
  ($target:expr, $condition:expr, $($arg:tt)+) => {{
    use $crate::Expect as _;
    let passed: bool = $condition;
    $target.check(
      stringify!($condition),
      passed,
      (!passed).then(|| format!($($arg)+)),
      concat!(file!(), ":", line!()),
    )
  }};
}

#[macro_export]
macro_rules! expect_false {
  ($target:expr, $condition:expr $(,)?) => {{
    use $crate::Expect as _;
    let passed: bool = !$condition;
    $target.check(
      concat!("!", stringify!($condition)),
      passed,
      (!passed).then(|| format!("expected `{}` to be false", stringify!($condition))),
      concat!(file!(), ":", line!()),
    )
  }};
}

#[macro_export]
macro_rules! expect_eq {
  ($target:expr, $left:expr, $right:expr $(,)?) => {{
    use $crate::Expect as _;
    let (passed, message) = match (&$left, &$right) {
      (left, right) => {
        let passed = *left == *right;
        let message = (!passed).then(|| {
          format!(
            "expected `{}` == `{}` (left: {:?}, right: {:?})",
            stringify!($left),
            stringify!($right),
            left,
            right
          )
        });
        (passed, message)
      },
    };
    $target.check(
      concat!(stringify!($left), " == ", stringify!($right)),
      passed,
      message,
      concat!(file!(), ":", line!()),
    )
  }};
}

#[macro_export]
macro_rules! expect_ne {
  ($target:expr, $left:expr, $right:expr $(,)?) => {{
    use $crate::Expect as _;
    let (passed, message) = match (&$left, &$right) {
      (left, right) => {
        let passed = *left != *right;
        let message = (!passed).then(|| {
          format!(
            "expected `{}` != `{}` (both: {:?})",
            stringify!($left),
            stringify!($right),
            left
          )
        });
        (passed, message)
      },
    };
    $target.check(
      concat!(stringify!($left), " != ", stringify!($right)),
      passed,
      message,
      concat!(file!(), ":", line!()),
    )
  }};
}

#[macro_export]
macro_rules! expect_near {
  ($target:expr, $left:expr, $right:expr, $epsilon:expr $(,)?) => {{
    use $crate::Expect as _;
    let left: f64 = $left;
    let right: f64 = $right;
    let epsilon: f64 = $epsilon;
    let passed = (left - right).abs() <= epsilon;
    $target.check(
      concat!(stringify!($left), " ~= ", stringify!($right)),
      passed,
      (!passed).then(|| {
        format!(
          "expected `{}` within {} of `{}` (left: {}, right: {})",
          stringify!($left),
          epsilon,
          stringify!($right),
          left,
          right
        )
      }),
      concat!(file!(), ":", line!()),
    )
  }};
}

#[macro_export]
macro_rules! expect_matches {
  ($target:expr, $value:expr, $($pattern:pat_param)|+ $(if $guard:expr)? $(,)?) => {{
    use $crate::Expect as _;
    let (passed, message) = match &$value {
      value => {
        let passed = matches!(value, $($pattern)|+ $(if $guard)?);
        let message = (!passed).then(|| {
          format!(
            "expected `{}` to match `{}` (value: {:?})",
            stringify!($value),
            stringify!($($pattern)|+),
            value
          )
        });
        (passed, message)
      },
    };
    $target.check(
      concat!(stringify!($value), " matches ", stringify!($($pattern)|+)),
      passed,
      message,
      concat!(file!(), ":", line!()),
    )
  }};
}
